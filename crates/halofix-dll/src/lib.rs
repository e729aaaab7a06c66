//! # halofix-dll
//!
//! Loadable module that applies the halofix mouse patch once, from
//! `DllMain`, when it is attached to the game process.

pub mod attach;
pub mod logging;

#[cfg(target_os = "windows")]
mod entry {
    use std::ffi::c_void;

    use halofix::{CurrentProcess, RegistrySettings};
    use windows::Win32::Foundation::{BOOL, HINSTANCE, HMODULE, TRUE};
    use windows::Win32::System::LibraryLoader::DisableThreadLibraryCalls;
    use windows::Win32::System::SystemServices::DLL_PROCESS_ATTACH;

    use crate::{attach, logging};

    fn attach_once() {
        let dir = attach::host_dir();
        if let Err(e) = logging::init_logging(&dir) {
            // Nowhere to log to; patch anyway
            eprintln!("halofix: {:#}", e);
        }

        let config = attach::load_config(&dir);
        let settings = RegistrySettings::new(config.settings_key.clone());
        // SAFETY: patching this process's own image is the purpose of the
        // library; addresses come from the selected offset table.
        let memory = unsafe { CurrentProcess::new() };

        attach::on_attach(memory, &settings, &config);
    }

    #[unsafe(no_mangle)]
    pub extern "system" fn DllMain(module: HINSTANCE, reason: u32, _reserved: *mut c_void) -> BOOL {
        if reason == DLL_PROCESS_ATTACH {
            // SAFETY: `module` is the handle the loader passed for this DLL.
            let _ = unsafe { DisableThreadLibraryCalls(HMODULE(module.0)) };

            if std::panic::catch_unwind(attach_once).is_err() {
                tracing::error!("Patch panicked");
            }
        }
        TRUE
    }
}
