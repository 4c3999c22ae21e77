fn main() {
    sqlwasm::cli::start_cli();
}
