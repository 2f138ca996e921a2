pub fn main() -> std::process::ExitCode {
    tpcframe::init::run()
}
