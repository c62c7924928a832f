fn main() {
    // ESP-IDF environment for the firmware build; host builds need nothing.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
