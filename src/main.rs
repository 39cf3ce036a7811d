fn main() {
    clinic_lib::run()
}
