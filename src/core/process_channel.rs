//! Linux memory channel backed by `process_vm_readv`.

use crate::core::channel::{MemoryChannel, ReadRequest};
use anyhow::{anyhow, Context, Result};
use log::{debug, log_enabled, Level};
use nix::sys::uio::{process_vm_readv, RemoteIoVec};
use nix::unistd::Pid;
use std::io::IoSliceMut;
use std::path::Path;

/// Kernel limit on iovec elements per call (`UIO_MAXIOV`).
const MAX_IOV_PER_CALL: usize = 1024;

/// Reads another process's memory, one syscall per batch chunk.
///
/// The kernel never splits a single iovec, so a short transfer means every
/// request past the returned byte count failed or was not attempted. Those
/// are retried one by one so a single bad pointer does not sink its batch.
pub struct ProcessChannel {
    pid: Pid,
}

impl ProcessChannel {
    /// Binds to `pid`. Fails if the process does not exist.
    pub fn attach(pid: i32) -> Result<Self> {
        if pid <= 0 {
            return Err(anyhow!("invalid pid {}", pid));
        }
        let proc_dir = format!("/proc/{}", pid);
        if !Path::new(&proc_dir).exists() {
            return Err(anyhow!("process {} not found", pid));
        }
        debug!("ProcessChannel attached to pid {}", pid);
        Ok(Self { pid: Pid::from_raw(pid) })
    }

    pub fn pid(&self) -> i32 {
        self.pid.as_raw()
    }

    fn read_single(&self, request: &ReadRequest) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; request.size];
        let remote = [RemoteIoVec {
            base: request.address as usize,
            len: request.size,
        }];
        let read = {
            let mut local = [IoSliceMut::new(&mut buffer)];
            process_vm_readv(self.pid, &mut local, &remote)
                .with_context(|| format!("process_vm_readv failed at 0x{:X} (size {})", request.address, request.size))?
        };
        if read != request.size {
            return Err(anyhow!(
                "short read at 0x{:X}: {} of {} bytes",
                request.address,
                read,
                request.size
            ));
        }
        Ok(buffer)
    }

    fn read_chunk(&self, requests: &[ReadRequest], out: &mut Vec<Result<Vec<u8>>>) {
        let mut buffers: Vec<Vec<u8>> = requests.iter().map(|r| vec![0u8; r.size]).collect();
        let remote: Vec<RemoteIoVec> = requests
            .iter()
            .map(|r| RemoteIoVec {
                base: r.address as usize,
                len: r.size,
            })
            .collect();

        let transferred = {
            let mut local: Vec<IoSliceMut> = buffers.iter_mut().map(|b| IoSliceMut::new(b)).collect();
            process_vm_readv(self.pid, &mut local, &remote).unwrap_or(0)
        };

        // requests fully covered by the transferred prefix
        let mut consumed = 0usize;
        let mut complete = 0usize;
        for request in requests {
            if consumed + request.size > transferred {
                break;
            }
            consumed += request.size;
            complete += 1;
        }

        if complete < requests.len() && log_enabled!(Level::Debug) {
            debug!(
                "Batch read stopped after {}/{} requests, falling back to individual reads",
                complete,
                requests.len()
            );
        }

        for (index, buffer) in buffers.into_iter().enumerate() {
            if index < complete {
                out.push(Ok(buffer));
            } else {
                out.push(self.read_single(&requests[index]));
            }
        }
    }
}

impl MemoryChannel for ProcessChannel {
    fn batch_read(&self, requests: &[ReadRequest]) -> Vec<Result<Vec<u8>>> {
        let mut out = Vec::with_capacity(requests.len());
        for chunk in requests.chunks(MAX_IOV_PER_CALL) {
            self.read_chunk(chunk, &mut out);
        }
        out
    }
}
