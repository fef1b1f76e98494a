use log::info;

use super::{
    common::{poll_until, wait_for_and_follow_pod_logs, wait_for_task_run_pod, Deadline},
    Backend, SubmitArgs, SubmitOutput,
};
use crate::{assemble, kubectl, resources::tekton, Error};

/// Submits the strategy as a single TaskRun, for clusters that run Tekton without Shipwright.
pub struct TektonBackend;

impl Backend for TektonBackend {
    fn submit(&self, args: SubmitArgs) -> Result<SubmitOutput, Error> {
        let SubmitArgs {
            kubectl,
            request,
            template,
            timeout,
        } = args;

        let task_run = assemble::assemble_task_run(request, template);

        let task_run = kubectl
            .create(&task_run)
            .map_err(Error::cluster_submission("create the TaskRun"))?;
        info!("Created {task_run}");

        let namespace = task_run.namespace.as_deref().unwrap_or(request.namespace);
        let resource = task_run.to_string();
        let deadline = Deadline::after(timeout);

        let pod_name = wait_for_task_run_pod(kubectl, &deadline, namespace, &task_run.name)?;

        wait_for_and_follow_pod_logs(kubectl, &deadline, namespace, &pod_name)
            .map_err(|error| error.into_error(&resource))?;

        let digest = poll_until(&deadline, &format!("{resource} to complete"), || {
            let status = kubectl
                .task_run(namespace, &task_run.name)
                .map_err(Error::cluster_submission("read the TaskRun"))?
                .status;
            match status.completion() {
                kubectl::Completion::Running => Ok(None),
                kubectl::Completion::Succeeded => Ok(Some(
                    status.result(tekton::IMAGE_DIGEST_RESULT).map(str::to_owned),
                )),
                kubectl::Completion::Failed(condition) => Err(Error::BuildFailed {
                    resource: resource.clone(),
                    reason: condition.to_string(),
                }),
            }
        })?;

        info!("{resource} succeeded");

        Ok(SubmitOutput { digest })
    }
}
