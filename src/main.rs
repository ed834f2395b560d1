fn main() {
    cminor_parsing::cli::run();
}
