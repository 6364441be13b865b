fn main() {
    tamil_selection_translator_lib::run()
}
