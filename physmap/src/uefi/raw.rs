//! Firmware tables and protocols, laid out as in the UEFI 2.x specification.
//!
//! Only the members this crate and the dump application call are typed; every other
//! slot is a `usize` placeholder that keeps the offsets right.

use core::ffi::c_void;

pub type Handle = *mut c_void;
pub type Event = *mut c_void;
pub type Char16 = u16;

#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(pub usize);

impl Status {
    const ERROR_BIT: usize = 1 << (usize::BITS - 1);

    pub const SUCCESS: Status = Status(0);
    /// Warning, not an error: `Delete` closed the handle but left the file in place.
    pub const WARN_DELETE_FAILURE: Status = Status(2);
    pub const INVALID_PARAMETER: Status = Status(Self::ERROR_BIT | 2);
    pub const UNSUPPORTED: Status = Status(Self::ERROR_BIT | 3);
    pub const BUFFER_TOO_SMALL: Status = Status(Self::ERROR_BIT | 5);
    pub const NOT_READY: Status = Status(Self::ERROR_BIT | 6);
    pub const DEVICE_ERROR: Status = Status(Self::ERROR_BIT | 7);
    pub const OUT_OF_RESOURCES: Status = Status(Self::ERROR_BIT | 9);
    pub const NOT_FOUND: Status = Status(Self::ERROR_BIT | 14);
    pub const ABORTED: Status = Status(Self::ERROR_BIT | 21);

    #[inline]
    pub fn is_error(self) -> bool {
        self.0 & Self::ERROR_BIT != 0
    }

    #[inline]
    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match crate::error::status_name(self.0) {
            Some(name) => f.write_str(name),
            None => write!(f, "status {:#x}", self.0),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

pub const LOADED_IMAGE_PROTOCOL_GUID: Guid = Guid {
    data1: 0x5b1b31a1,
    data2: 0x9562,
    data3: 0x11d2,
    data4: [0x8e, 0x3f, 0x00, 0xa0, 0xc9, 0x69, 0x72, 0x3b],
};

pub const SIMPLE_FILE_SYSTEM_PROTOCOL_GUID: Guid = Guid {
    data1: 0x964e5b22,
    data2: 0x6459,
    data3: 0x11d2,
    data4: [0x8e, 0x39, 0x00, 0xa0, 0xc9, 0x69, 0x72, 0x3b],
};

/// Memory type used for our own pool allocations.
pub const LOADER_DATA: u32 = 2;

#[repr(C)]
pub struct TableHeader {
    pub signature: u64,
    pub revision: u32,
    pub header_size: u32,
    pub crc32: u32,
    pub reserved: u32,
}

#[repr(C)]
pub struct SystemTable {
    pub hdr: TableHeader,
    pub firmware_vendor: *const Char16,
    pub firmware_revision: u32,
    pub console_in_handle: Handle,
    pub con_in: *mut SimpleTextInputProtocol,
    pub console_out_handle: Handle,
    pub con_out: *mut SimpleTextOutputProtocol,
    pub standard_error_handle: Handle,
    pub std_err: *mut SimpleTextOutputProtocol,
    pub runtime_services: *mut c_void,
    pub boot_services: *mut BootServices,
    pub number_of_table_entries: usize,
    pub configuration_table: *mut c_void,
}

/// Layout of one entry in the `GetMemoryMap` buffer. Entries are `descriptor_size` apart,
/// which may be larger than this struct.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawMemoryDescriptor {
    pub ty: u32,
    pub physical_start: u64,
    pub virtual_start: u64,
    pub number_of_pages: u64,
    pub attribute: u64,
}

#[repr(C)]
pub struct BootServices {
    pub hdr: TableHeader,

    raise_tpl: usize,
    restore_tpl: usize,

    allocate_pages: usize,
    free_pages: usize,
    pub get_memory_map: unsafe extern "efiapi" fn(
        memory_map_size: *mut usize,
        memory_map: *mut RawMemoryDescriptor,
        map_key: *mut usize,
        descriptor_size: *mut usize,
        descriptor_version: *mut u32,
    ) -> Status,
    pub allocate_pool: unsafe extern "efiapi" fn(pool_type: u32, size: usize, buffer: *mut *mut u8) -> Status,
    pub free_pool: unsafe extern "efiapi" fn(buffer: *mut u8) -> Status,

    create_event: usize,
    set_timer: usize,
    wait_for_event: usize,
    signal_event: usize,
    close_event: usize,
    check_event: usize,

    install_protocol_interface: usize,
    reinstall_protocol_interface: usize,
    uninstall_protocol_interface: usize,
    pub handle_protocol:
        unsafe extern "efiapi" fn(handle: Handle, protocol: *const Guid, interface: *mut *mut c_void) -> Status,
    reserved: usize,
    register_protocol_notify: usize,
    locate_handle: usize,
    locate_device_path: usize,
    install_configuration_table: usize,

    load_image: usize,
    start_image: usize,
    exit: usize,
    unload_image: usize,
    exit_boot_services: usize,

    get_next_monotonic_count: usize,
    stall: usize,
    pub set_watchdog_timer: unsafe extern "efiapi" fn(
        timeout: usize,
        watchdog_code: u64,
        data_size: usize,
        watchdog_data: *const Char16,
    ) -> Status,

    connect_controller: usize,
    disconnect_controller: usize,

    open_protocol: usize,
    close_protocol: usize,
    open_protocol_information: usize,

    protocols_per_handle: usize,
    locate_handle_buffer: usize,
    locate_protocol: usize,
    install_multiple_protocol_interfaces: usize,
    uninstall_multiple_protocol_interfaces: usize,

    calculate_crc32: usize,

    pub copy_mem: unsafe extern "efiapi" fn(destination: *mut c_void, source: *const c_void, length: usize),
    set_mem: usize,
    create_event_ex: usize,
}

#[repr(C)]
#[derive(Debug, Default, Clone, Copy)]
pub struct InputKey {
    pub scan_code: u16,
    pub unicode_char: Char16,
}

#[repr(C)]
pub struct SimpleTextInputProtocol {
    pub reset: unsafe extern "efiapi" fn(this: *mut SimpleTextInputProtocol, extended_verification: bool) -> Status,
    pub read_key_stroke: unsafe extern "efiapi" fn(this: *mut SimpleTextInputProtocol, key: *mut InputKey) -> Status,
    pub wait_for_key: Event,
}

#[repr(C)]
pub struct SimpleTextOutputProtocol {
    pub reset: unsafe extern "efiapi" fn(this: *mut SimpleTextOutputProtocol, extended_verification: bool) -> Status,
    pub output_string: unsafe extern "efiapi" fn(this: *mut SimpleTextOutputProtocol, string: *const Char16) -> Status,
    test_string: usize,
    query_mode: usize,
    set_mode: usize,
    set_attribute: usize,
    clear_screen: usize,
    set_cursor_position: usize,
    enable_cursor: usize,
    mode: usize,
}

#[repr(C)]
pub struct LoadedImageProtocol {
    pub revision: u32,
    pub parent_handle: Handle,
    pub system_table: *mut SystemTable,
    pub device_handle: Handle,
    pub file_path: *mut c_void,
    reserved: *mut c_void,
    pub load_options_size: u32,
    pub load_options: *mut c_void,
    pub image_base: *mut c_void,
    pub image_size: u64,
    pub image_code_type: u32,
    pub image_data_type: u32,
    unload: usize,
}

#[repr(C)]
pub struct SimpleFileSystemProtocol {
    pub revision: u64,
    pub open_volume:
        unsafe extern "efiapi" fn(this: *mut SimpleFileSystemProtocol, root: *mut *mut FileProtocol) -> Status,
}

pub const FILE_MODE_READ: u64 = 0x0000_0000_0000_0001;
pub const FILE_MODE_WRITE: u64 = 0x0000_0000_0000_0002;
pub const FILE_MODE_CREATE: u64 = 0x8000_0000_0000_0000;

#[repr(C)]
pub struct FileProtocol {
    pub revision: u64,
    pub open: unsafe extern "efiapi" fn(
        this: *mut FileProtocol,
        new_handle: *mut *mut FileProtocol,
        file_name: *const Char16,
        open_mode: u64,
        attributes: u64,
    ) -> Status,
    pub close: unsafe extern "efiapi" fn(this: *mut FileProtocol) -> Status,
    pub delete: unsafe extern "efiapi" fn(this: *mut FileProtocol) -> Status,
    read: usize,
    pub write: unsafe extern "efiapi" fn(this: *mut FileProtocol, buffer_size: *mut usize, buffer: *const u8) -> Status,
    get_position: usize,
    set_position: usize,
    get_info: usize,
    set_info: usize,
    pub flush: unsafe extern "efiapi" fn(this: *mut FileProtocol) -> Status,
}
