use std::{
    os::unix::process::CommandExt,
    process::{Command, ExitCode},
    sync::atomic::{AtomicBool, Ordering},
};

use env_logger::Env;
use log::{debug, error, warn};
use nix::{
    errno::Errno,
    sys::{
        ptrace,
        wait::{waitpid, WaitStatus},
    },
    unistd::{fork, ForkResult, Pid},
};

use syscall_insight::{
    cli::{DecodeArgs, Mode, TraceArgs, INSIGHT_ARGS},
    peeker_poker::Tracee,
    process::LiveProcess,
    syscall_object::{decode, DecodeConfig},
    types::{AddressSpaceRoot, SyscallInvocation},
    writer::ReportWriter,
};

static HALT_TRACING: AtomicBool = AtomicBool::new(false);

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let args = &*INSIGHT_ARGS;
    let mut writer = match ReportWriter::initialize(args.output.as_deref()) {
        Ok(writer) => writer,
        Err(error) => {
            eprintln!("Could not open or create the output file: {error}");
            return ExitCode::from(100);
        }
    };
    if let Err(error) = ctrlc::set_handler(|| HALT_TRACING.store(true, Ordering::SeqCst)) {
        warn!("ctrl-c will not detach cleanly: {error}");
    }
    let config = args.decode_config();
    let outcome = match &args.mode {
        Mode::Decode(decode_args) => decode_once(decode_args, &config, &mut writer),
        Mode::Trace(trace_args) => trace(trace_args, &config, &mut writer),
    };
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            let _ = writer.write_diagnostic(&format!("Exception in main(): {message}"));
            ExitCode::FAILURE
        }
    }
}

fn decode_once(
    args: &DecodeArgs,
    config: &DecodeConfig,
    writer: &mut ReportWriter,
) -> Result<(), String> {
    let pid = Pid::from_raw(args.pid);
    let root = AddressSpaceRoot(args.cr3.unwrap_or(args.pid as u64));
    let invocation = SyscallInvocation::new(args.nr, args.registers(), root);
    let report = decode(&Tracee::new(pid), &LiveProcess::new(pid), &invocation, config);
    writer
        .write_report(&report)
        .map_err(|error| format!("writing the report: {error}"))
}

fn trace(args: &TraceArgs, config: &DecodeConfig, writer: &mut ReportWriter) -> Result<(), String> {
    let (child, attached) = match args.pid {
        Some(pid) => {
            let child = Pid::from_raw(pid);
            ptrace::attach(child).map_err(|errno| format!("attaching to {child}: {errno}"))?;
            (child, true)
        }
        None => (spawn_traced(&args.command)?, false),
    };
    // initial stop: SIGSTOP after attach, SIGTRAP after execve
    waitpid(child, None).map_err(|errno| format!("waiting for {child}: {errno}"))?;

    let engine = Tracee::new(child);
    let process = LiveProcess::new(child);
    let root = AddressSpaceRoot(child.as_raw() as u64);
    let mut syscall_entering = true;
    'main_loop: loop {
        if HALT_TRACING.load(Ordering::SeqCst) {
            if attached {
                let _ = ptrace::detach(child, None);
            }
            break 'main_loop;
        }
        if let Err(errno) = ptrace::syscall(child, None) {
            debug!("ptrace-syscall: {errno}");
            break 'main_loop;
        }
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, code)) => {
                debug!("{child} exited with {code}");
                break 'main_loop;
            }
            Ok(WaitStatus::Signaled(_, signal, _)) => {
                debug!("{child} killed by {signal}");
                break 'main_loop;
            }
            Ok(_) => {}
            Err(errno) => return Err(format!("waiting for {child}: {errno}")),
        }
        if syscall_entering {
            match ptrace::getregs(child) {
                Ok(registers) => {
                    let invocation = SyscallInvocation::from_registers(&registers, root);
                    let report = decode(&engine, &process, &invocation, config);
                    if let Err(error) = writer.write_report(&report) {
                        error!("writing the report: {error}");
                    }
                }
                Err(Errno::ESRCH) => break 'main_loop,
                Err(errno) => warn!("getting registers: {errno}"),
            }
        }
        syscall_entering = !syscall_entering;
    }
    Ok(())
}

fn spawn_traced(command_line: &[String]) -> Result<Pid, String> {
    let (program, arguments) = command_line
        .split_first()
        .ok_or_else(|| "no command to trace".to_owned())?;
    match unsafe { fork() }.map_err(|errno| format!("fork failed: {errno}"))? {
        ForkResult::Parent { child } => Ok(child),
        ForkResult::Child => {
            let mut command = Command::new(program);
            command.args(arguments);
            // TRACE ME
            if let Err(errno) = ptrace::traceme() {
                eprintln!("Error: could not be traced: {errno}");
                std::process::exit(1);
            }
            // EXECUTE
            let failure = command.exec();
            // This won't be reached unless exec fails
            eprintln!("Error: could not execute program: {failure}");
            std::process::exit(failure.raw_os_error().unwrap_or(1))
        }
    }
}
