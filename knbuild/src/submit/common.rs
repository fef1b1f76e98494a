use std::{error::Error as StdError, fmt, thread, time};

use log::{debug, info, warn};

use crate::{
    cancel,
    kubectl::{self, PodStatus},
    Error, Result,
};

pub const LOG_AVAILABILITY_TIMEOUT: time::Duration = time::Duration::from_secs(600);
pub const POLLING_INTERVAL: time::Duration = time::Duration::from_secs(2);

pub struct Deadline(time::Instant);

/// Why a [`Deadline`] refused to sleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expired {
    Timeout,
    Interrupted,
}

impl Expired {
    pub fn into_error(self, waiting_for: impl Into<String>) -> Error {
        match self {
            Expired::Timeout => Error::Timeout(waiting_for.into()),
            Expired::Interrupted => Error::Interrupted,
        }
    }
}

impl Deadline {
    /// Create a new deadline that times out after the provided duration.
    pub fn after(timeout: time::Duration) -> Self {
        Self(time::Instant::now() + timeout)
    }

    /// If there is enough time to sleep before the deadline, sleeps and returns Ok. Otherwise,
    /// or when the user pressed Ctrl+C, returns Err.
    pub fn sleep(&self, duration: time::Duration) -> Result<(), Expired> {
        if cancel::is_interrupted() {
            return Err(Expired::Interrupted);
        }
        if time::Instant::now() + duration < self.0 {
            thread::sleep(duration);
            if cancel::is_interrupted() {
                return Err(Expired::Interrupted);
            }
            Ok(())
        } else {
            Err(Expired::Timeout)
        }
    }

    /// Whichever of the two deadlines expires first.
    pub fn earliest(&self, other: &Deadline) -> Deadline {
        Deadline(self.0.min(other.0))
    }
}

/// Calls `poll` every [`POLLING_INTERVAL`] until it returns a value or the deadline expires.
pub fn poll_until<T>(
    deadline: &Deadline,
    waiting_for: &str,
    mut poll: impl FnMut() -> Result<Option<T>, Error>,
) -> Result<T, Error> {
    loop {
        if let Some(value) = poll()? {
            return Ok(value);
        }
        deadline
            .sleep(POLLING_INTERVAL)
            .map_err(|expired| expired.into_error(waiting_for))?;
    }
}

#[derive(Debug)]
pub enum PodLogPollError {
    BadStatus(Box<PodStatus>),
    Expired(Expired),
    Other(Box<dyn StdError + Send + Sync>),
}

impl fmt::Display for PodLogPollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PodLogPollError::BadStatus(status) => write!(
                f,
                "Pod logs will not become available because it reached status {}",
                status.display_multi_line(1),
            ),
            PodLogPollError::Expired(Expired::Timeout) => write!(
                f,
                "Deadline exceeded while waiting for pod logs to become available!"
            ),
            PodLogPollError::Expired(Expired::Interrupted) => {
                write!(f, "Interrupted while waiting for pod logs")
            }
            PodLogPollError::Other(e) => e.fmt(f),
        }
    }
}

impl StdError for PodLogPollError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            PodLogPollError::Other(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<Box<dyn StdError + Send + Sync>> for PodLogPollError {
    fn from(error: Box<dyn StdError + Send + Sync>) -> Self {
        PodLogPollError::Other(error)
    }
}

impl PodLogPollError {
    /// Converts into an error that blames the resource the pod belongs to.
    pub fn into_error(self, resource: &str) -> Error {
        match self {
            PodLogPollError::BadStatus(_) => Error::BuildFailed {
                resource: resource.to_owned(),
                reason: self.to_string(),
            },
            PodLogPollError::Expired(expired) => {
                expired.into_error(format!("the logs of {resource}"))
            }
            PodLogPollError::Other(source) => Error::ClusterSubmission {
                action: "follow the build logs",
                source,
            }
            .unless_interrupted(),
        }
    }
}

/// Waits for the pod's logs until the build deadline or [`LOG_AVAILABILITY_TIMEOUT`], whichever
/// comes first, then streams them.
pub fn wait_for_and_follow_pod_logs(
    kubectl: &kubectl::Kubectl,
    deadline: &Deadline,
    namespace: &str,
    name: &str,
) -> Result<(), PodLogPollError> {
    fn log_status(status: &kubectl::PodStatus) {
        debug!("Pod status: {status}");
    }

    info!("Waiting for logs of Pod {namespace}/{name} to become available...");

    let deadline = deadline.earliest(&Deadline::after(LOG_AVAILABILITY_TIMEOUT));
    let mut status = kubectl.pod(namespace, name)?.status;
    let mut warned_unschedulable = false;
    log_status(&status);
    loop {
        match status.are_logs_available() {
            Some(true) => break,
            Some(false) => return Err(PodLogPollError::BadStatus(status.into())),
            None => {
                if status.is_unschedulable() && !warned_unschedulable {
                    warn!("The Pod is unschedulable which means that the Pod is queued. The Pod will start once the cluster has sufficient capacity.");
                    warned_unschedulable = true;
                }
            }
        }

        deadline
            .sleep(POLLING_INTERVAL)
            .map_err(PodLogPollError::Expired)?;

        status = {
            let new_status = kubectl.pod(namespace, name)?.status;
            if new_status != status {
                log_status(&new_status);
            }
            new_status
        }
    }

    kubectl.follow_pod_logs(namespace, name)?;

    Ok(())
}

/// Waits for the TaskRun to be assigned a pod and returns the pod name. Fails when the TaskRun
/// completes without one.
pub fn wait_for_task_run_pod(
    kubectl: &kubectl::Kubectl,
    deadline: &Deadline,
    namespace: &str,
    task_run_name: &str,
) -> Result<String, Error> {
    let resource = format!("TaskRun {namespace}/{task_run_name}");
    poll_until(deadline, &format!("the pod of {resource}"), || {
        let task_run = kubectl
            .task_run(namespace, task_run_name)
            .map_err(Error::cluster_submission("read the TaskRun"))?;
        if let Some(pod_name) = task_run.status.pod_name() {
            return Ok(Some(pod_name.to_owned()));
        }
        match task_run.status.completion() {
            kubectl::Completion::Failed(condition) => Err(Error::BuildFailed {
                resource: resource.clone(),
                reason: condition.to_string(),
            }),
            _ => Ok(None),
        }
    })
}
