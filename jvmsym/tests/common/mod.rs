//! Fixture-driven `ProcessRunner` shared by the integration tests.

#![allow(dead_code)]

use jvmsym::runner::{CommandOutput, ProcessRunner};
use std::io;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

// `vmmap <pid> | grep libjvm.dylib` on macOS 13, JDK 17
pub const VMMAP_OUTPUT: &str = "\
__TEXT                      000000010a2b3000-000000010a500000 [ 2356K  2356K     0K     0K] r-x/r-x SM=COW          /Library/Java/JavaVirtualMachines/jdk-17.jdk/Contents/Home/lib/server/libjvm.dylib
__DATA_CONST                000000010a500000-000000010a540000 [  256K   256K   256K     0K] r--/rw- SM=COW          /Library/Java/JavaVirtualMachines/jdk-17.jdk/Contents/Home/lib/server/libjvm.dylib
__LINKEDIT                  000000010b100000-000000010b400000 [ 3072K  1024K     0K     0K] r--/r-- SM=COW          /Library/Java/JavaVirtualMachines/jdk-17.jdk/Contents/Home/lib/server/libjvm.dylib
";

pub const NM_OUTPUT: &str = "\
0000000000001020 T _foo
0000000000002040 t _bar
                 U _undef
00000000005f3a10 S _gHotSpotVMStructs
";

pub const BASE: u64 = 0x10a2b_3000;

/// Answers `vmmap ...` and `nm ...` scripts with canned output and records
/// every script it was asked to run.
pub struct FakeRunner {
    pub vmmap: CommandOutput,
    pub nm: CommandOutput,
    pub delay: Duration,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::with_outputs(CommandOutput::stdout(VMMAP_OUTPUT), CommandOutput::stdout(NM_OUTPUT))
    }

    pub fn with_outputs(vmmap: CommandOutput, nm: CommandOutput) -> Self {
        Self { vmmap, nm, delay: Duration::ZERO, calls: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, command: &[String]) -> io::Result<CommandOutput> {
        assert_eq!(&command[..2], ["/bin/sh", "-c"], "tools must run through the shell");
        let script = command[2].clone();
        self.calls.lock().unwrap().push(script.clone());
        thread::sleep(self.delay);

        if script.starts_with("vmmap ") {
            Ok(self.vmmap.clone())
        } else if script.starts_with("nm ") {
            Ok(self.nm.clone())
        } else {
            Err(io::Error::new(io::ErrorKind::NotFound, format!("no fixture for {script}")))
        }
    }
}
