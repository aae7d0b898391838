use std::process::ExitCode;

fn main() -> ExitCode {
    rowsift_lib::run()
}
