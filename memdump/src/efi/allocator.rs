//! Global allocator backed by boot-services pool memory.

use core::{
    alloc::{GlobalAlloc, Layout},
    ptr,
    sync::atomic::{AtomicPtr, Ordering},
};

use physmap::uefi::raw::{BootServices, LOADER_DATA};

/// Pool allocations are 8-byte aligned.
const POOL_ALIGN: usize = 8;

static BOOT_SERVICES: AtomicPtr<BootServices> = AtomicPtr::new(ptr::null_mut());

/// # Safety
/// `bs` must stay valid until boot services are exited or the image returns.
pub unsafe fn init(bs: *mut BootServices) {
    BOOT_SERVICES.store(bs, Ordering::Release);
}

struct PoolAllocator;

#[global_allocator]
static ALLOCATOR: PoolAllocator = PoolAllocator;

unsafe impl GlobalAlloc for PoolAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let Some(bs) = BOOT_SERVICES.load(Ordering::Acquire).as_ref() else {
            return ptr::null_mut();
        };

        let align = layout.align();
        if align <= POOL_ALIGN {
            let mut buffer = ptr::null_mut();
            return match (bs.allocate_pool)(LOADER_DATA, layout.size(), &mut buffer).is_success() {
                true => buffer,
                false => ptr::null_mut(),
            };
        }

        // over-allocate and keep the pool pointer in the word just below the aligned block
        let Some(size) = layout.size().checked_add(align) else {
            return ptr::null_mut();
        };
        let mut raw = ptr::null_mut::<u8>();
        if !(bs.allocate_pool)(LOADER_DATA, size, &mut raw).is_success() {
            return ptr::null_mut();
        }
        let offset = align - (raw as usize & (align - 1));
        let aligned = raw.add(offset);
        aligned.cast::<*mut u8>().sub(1).write(raw);
        aligned
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        let Some(bs) = BOOT_SERVICES.load(Ordering::Acquire).as_ref() else {
            return;
        };
        let raw = match layout.align() <= POOL_ALIGN {
            true => ptr,
            false => ptr.cast::<*mut u8>().sub(1).read(),
        };
        (bs.free_pool)(raw);
    }
}
