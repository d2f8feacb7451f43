mod allocator;
mod console;

use core::{panic::PanicInfo, ptr};

use acquire::{conclude, DumpConfig, Engine, Error, Summary};
use physmap::uefi::{
    raw::{BootServices, Handle, Status, SystemTable},
    Firmware,
};

use self::console::{ConsoleProgress, KeyPress};
use crate::volume::BootVolume;

fn exit_status(err: &Error) -> Status {
    match err {
        Error::Provider(physmap::Error::Provider { status, .. }) | Error::Io { status, .. } => Status(*status),
        Error::Provider(_) => Status::DEVICE_ERROR,
        Error::ResourceExhausted(_) => Status::OUT_OF_RESOURCES,
        Error::Config(_) => Status::INVALID_PARAMETER,
    }
}

/// # Safety
/// Boot services must be available for the whole call.
unsafe fn dump(bs: &BootServices, image: Handle) -> acquire::Result<Summary> {
    let mut volume = BootVolume::open(bs, image)?;
    let mut engine = Engine::new(DumpConfig::default())?;
    let firmware = Firmware::new(bs);
    engine.run(&firmware, &mut volume, &mut ConsoleProgress::default())
}

#[no_mangle]
extern "efiapi" fn efi_main(image: Handle, st: *mut SystemTable) -> Status {
    let Some(st) = (unsafe { st.as_ref() }) else {
        return Status::INVALID_PARAMETER;
    };
    unsafe {
        allocator::init(st.boot_services);
        console::init(st.con_out);
    }
    let Some(bs) = (unsafe { st.boot_services.as_ref() }) else {
        return Status::INVALID_PARAMETER;
    };

    // the firmware resets the machine after five minutes in a boot application
    let status = unsafe { (bs.set_watchdog_timer)(0, 0, 0, ptr::null()) };
    if status.is_error() {
        log::warn!("failed to disable the watchdog timer: {status}");
    }

    let mut ack = unsafe { KeyPress::new(st.con_in) };
    match conclude(unsafe { dump(bs, image) }, &mut ack) {
        Ok(_) => Status::SUCCESS,
        Err(err) => exit_status(&err),
    }
}

#[panic_handler]
fn panic(info: &PanicInfo) -> ! {
    log::error!("{info}");
    loop {
        core::hint::spin_loop();
    }
}
