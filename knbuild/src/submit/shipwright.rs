use log::{debug, info};

use super::{
    common::{poll_until, wait_for_and_follow_pod_logs, wait_for_task_run_pod, Deadline},
    Backend, SubmitArgs, SubmitOutput,
};
use crate::{assemble, kubectl, Error};

/// Submits a `Build` and a `BuildRun` and lets Shipwright run the strategy.
pub struct ShipwrightBackend;

impl Backend for ShipwrightBackend {
    fn submit(&self, args: SubmitArgs) -> Result<SubmitOutput, Error> {
        let SubmitArgs {
            kubectl,
            request,
            template,
            timeout,
        } = args;

        let set = assemble::assemble(request, template);

        let strategy = kubectl
            .apply(&set.strategy)
            .map_err(Error::cluster_submission("apply the build strategy"))?;
        debug!("Applied {strategy}");

        let build = kubectl
            .apply(&set.build)
            .map_err(Error::cluster_submission("apply the Build"))?;
        debug!("Applied {build}");

        let build_run = kubectl
            .create(&set.build_run)
            .map_err(Error::cluster_submission("create the BuildRun"))?;
        info!("Created {build_run}");

        let namespace = build_run
            .namespace
            .as_deref()
            .unwrap_or(request.namespace);
        let resource = build_run.to_string();
        let deadline = Deadline::after(timeout);

        let read_build_run = || {
            kubectl
                .build_run(namespace, &build_run.name)
                .map_err(Error::cluster_submission("read the BuildRun"))
        };

        let build_failed = |status: &kubectl::BuildRunStatus, condition: &kubectl::Condition| {
            Error::BuildFailed {
                resource: resource.clone(),
                reason: match &status.failure_details {
                    Some(details) => details.to_string(),
                    None => condition.to_string(),
                },
            }
        };

        let task_run_name = poll_until(&deadline, &format!("the TaskRun of {resource}"), || {
            let build_run = read_build_run()?;
            if let Some(name) = build_run.status.task_run_name() {
                return Ok(Some(name.to_owned()));
            }
            match build_run.status.completion() {
                kubectl::Completion::Failed(condition) => {
                    Err(build_failed(&build_run.status, condition))
                }
                _ => Ok(None),
            }
        })?;
        debug!("BuildRun {namespace}/{} runs TaskRun {task_run_name}", build_run.name);

        let pod_name = wait_for_task_run_pod(kubectl, &deadline, namespace, &task_run_name)?;

        wait_for_and_follow_pod_logs(kubectl, &deadline, namespace, &pod_name)
            .map_err(|error| error.into_error(&resource))?;

        let digest = poll_until(&deadline, &format!("{resource} to complete"), || {
            let build_run = read_build_run()?;
            match build_run.status.completion() {
                kubectl::Completion::Running => Ok(None),
                kubectl::Completion::Succeeded => {
                    Ok(Some(build_run.status.digest().map(str::to_owned)))
                }
                kubectl::Completion::Failed(condition) => {
                    Err(build_failed(&build_run.status, condition))
                }
            }
        })?;

        info!("{resource} succeeded");

        Ok(SubmitOutput { digest })
    }
}
