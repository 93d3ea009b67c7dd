//! Real-time scheduling helpers (Linux SCHED_FIFO / affinity / mlockall;
//! macOS mlockall). Applied once per process, best-effort with warnings.

use crate::cli::RtLock;

#[cfg(target_os = "linux")]
pub fn setup_rt_once(rt: bool, prio: Option<i32>, lock: RtLock, rt_cpu: Option<usize>) {
    use libc::{
        CPU_ISSET, CPU_SET, CPU_ZERO, SCHED_FIFO, sched_get_priority_max, sched_get_priority_min,
        sched_param, sched_setscheduler,
    };
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !rt {
        return;
    }

    fn apply_mem_lock(lock: RtLock) -> std::io::Result<()> {
        use libc::{MCL_CURRENT, MCL_FUTURE, mlockall};
        let flags = match lock {
            RtLock::None => return Ok(()),
            RtLock::Current => MCL_CURRENT,
            RtLock::All => MCL_CURRENT | MCL_FUTURE,
        };
        if unsafe { mlockall(flags) } != 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    }

    fn apply_fifo_priority(prio: Option<i32>) -> std::io::Result<()> {
        let (min, max) = unsafe {
            let min = sched_get_priority_min(SCHED_FIFO);
            let max = sched_get_priority_max(SCHED_FIFO);
            if min < 0 || max < 0 { (1, 99) } else { (min, max) }
        };
        let param = sched_param {
            sched_priority: prio.unwrap_or(max).clamp(min, max),
        };
        if unsafe { sched_setscheduler(0, SCHED_FIFO, &param) } != 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    }

    fn apply_affinity(rt_cpu: Option<usize>) -> std::io::Result<()> {
        let target = rt_cpu.unwrap_or(0);
        let setsize = std::mem::size_of::<libc::cpu_set_t>();
        if target >= setsize * 8 {
            return Err(std::io::Error::other("requested CPU exceeds cpu_set_t"));
        }
        let mut allowed: libc::cpu_set_t = unsafe { std::mem::zeroed() };
        if unsafe { libc::sched_getaffinity(0, setsize, &mut allowed) } != 0 {
            return Err(std::io::Error::last_os_error());
        }
        if !unsafe { CPU_ISSET(target, &allowed) } {
            return Err(std::io::Error::other(
                "requested CPU not permitted by current affinity mask",
            ));
        }
        let mut desired: libc::cpu_set_t = unsafe { std::mem::zeroed() };
        unsafe {
            CPU_ZERO(&mut desired);
            CPU_SET(target, &mut desired);
        }
        if unsafe { libc::sched_setaffinity(0, setsize, &desired) } != 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    }

    RT_ONCE.get_or_init(|| {
        match apply_mem_lock(lock) {
            Ok(()) => eprintln!("RT: memory lock = {lock:?}"),
            Err(err) => eprintln!(
                "Warning: mlockall failed: {err}; hint: needs CAP_IPC_LOCK (or root) and sufficient 'ulimit -l'"
            ),
        }
        if let Err(err) = apply_fifo_priority(prio) {
            eprintln!(
                "Warning: sched_setscheduler(SCHED_FIFO) failed: {err}; hint: needs CAP_SYS_NICE or root"
            );
        }
        if let Err(err) = apply_affinity(rt_cpu) {
            eprintln!("Warning: affinity not applied: {err}");
        }
    });
}

#[cfg(target_os = "macos")]
pub fn setup_rt_once(rt: bool, _prio: Option<i32>, lock: RtLock, _rt_cpu: Option<usize>) {
    use libc::{MCL_CURRENT, MCL_FUTURE, mlockall};
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();
    if !rt {
        return;
    }
    RT_ONCE.get_or_init(|| {
        let flags = match lock {
            RtLock::None => None,
            RtLock::Current => Some(MCL_CURRENT),
            RtLock::All => Some(MCL_CURRENT | MCL_FUTURE),
        };
        if let Some(flags) = flags {
            if unsafe { mlockall(flags) } != 0 {
                let err = std::io::Error::last_os_error();
                eprintln!("Warning: mlockall failed: {err}");
            } else {
                eprintln!("RT: memory lock = {lock:?}");
            }
        }
        eprintln!("Warning: macOS does not support SCHED_FIFO or affinity; only mlockall applied.");
    });
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub fn setup_rt_once(rt: bool, _prio: Option<i32>, _lock: RtLock, _rt_cpu: Option<usize>) {
    if rt {
        eprintln!("Warning: real-time mode is not supported on this OS.");
    }
}
