#![cfg_attr(target_os = "uefi", no_std, no_main)]

extern crate alloc;

#[cfg(target_os = "uefi")]
mod efi;
#[cfg_attr(not(target_os = "uefi"), allow(dead_code))]
mod text;
#[cfg_attr(not(target_os = "uefi"), allow(dead_code))]
mod volume;

#[cfg(not(target_os = "uefi"))]
fn main() {
    eprintln!("\n\x1b[31m error: memdump runs from the UEFI shell, build it with --target x86_64-unknown-uefi \x1b[0m");
    std::process::exit(1)
}
