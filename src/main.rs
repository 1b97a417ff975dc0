use mysh::{Interpreter, signals};

fn main() {
    env_logger::init();

    if let Err(e) = signals::install() {
        eprintln!("mysh: {e:#}");
        std::process::exit(1);
    }

    let code = Interpreter::new().repl().unwrap_or_else(|e| {
        eprintln!("mysh: {e:#}");
        1
    });
    std::process::exit(code);
}
