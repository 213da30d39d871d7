//! Boot-services-pool allocator.
//!
//! Pool allocations are 8-aligned; larger alignments are produced by
//! over-allocating and stashing the pool pointer just below the aligned
//! block.

use core::alloc::{GlobalAlloc, Layout};
use core::ffi::c_void;
use core::ptr;

use super::status::Status;
use super::tables::{self, MEMORY_TYPE_BOOT_SERVICES_DATA};

const POOL_ALIGNMENT: usize = 8;

/// `GlobalAlloc` backed by `AllocatePool`/`FreePool`. Usable only while boot
/// services are live, which covers a boot driver's whole lifetime.
pub struct PoolAllocator;

unsafe impl GlobalAlloc for PoolAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let bs = tables::boot_services();
        let align = layout.align();
        let size = layout.size();

        if align > POOL_ALIGNMENT {
            // Allocate extra room for the worst-case shift plus the stashed
            // pool pointer.
            let mut pool: *mut c_void = ptr::null_mut();
            let status = unsafe {
                (bs.allocate_pool)(
                    MEMORY_TYPE_BOOT_SERVICES_DATA,
                    size + align,
                    &mut pool,
                )
            };
            if status != Status::SUCCESS {
                return ptr::null_mut();
            }
            let aligned = ((pool as usize + align) & !(align - 1)) as *mut u8;
            unsafe {
                (aligned.cast::<*mut c_void>()).sub(1).write_unaligned(pool);
            }
            aligned
        } else {
            let mut pool: *mut c_void = ptr::null_mut();
            let status = unsafe {
                (bs.allocate_pool)(MEMORY_TYPE_BOOT_SERVICES_DATA, size, &mut pool)
            };
            if status != Status::SUCCESS {
                return ptr::null_mut();
            }
            pool.cast()
        }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        let bs = tables::boot_services();
        let pool = if layout.align() > POOL_ALIGNMENT {
            unsafe { (ptr.cast::<*mut c_void>()).sub(1).read_unaligned() }
        } else {
            ptr.cast()
        };
        unsafe {
            (bs.free_pool)(pool);
        }
    }
}

#[global_allocator]
static ALLOCATOR: PoolAllocator = PoolAllocator;
