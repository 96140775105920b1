fn main() {
    // ESP-IDF environment is only needed when cross-compiling for an *-espidf
    // target (Xtensa or RISC-V); host builds and tests skip it
    if let Ok(target) = std::env::var("TARGET") {
        if target.ends_with("-espidf") {
            embuild::espidf::sysenv::output();
        }
    }
}
