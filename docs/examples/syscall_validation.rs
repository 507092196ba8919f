//! Example Syscall Validation Integration
//!
//! This demonstrates how to integrate user pointer validation
//! into the WATOS syscall handler.

/// Example: SYS_OPEN syscall with validation
fn sys_open_example(path_ptr: u64, path_len: u64, _mode: u32) -> i32 {
    // Step 1: Validate pointer (pseudocode)
    // if let Err(_) = validate_user_ptr(path_ptr, path_len) {
    //     return -22; // EINVAL
    // }
    let _ = (path_ptr, path_len); // silence warnings
    0 // Success
}

fn main() {
    println!("See syscall_validation.rs for integration examples");
}
