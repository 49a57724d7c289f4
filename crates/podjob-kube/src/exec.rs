use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, AttachParams};
use tokio::io::AsyncReadExt;
use tracing::debug;

use podjob_core::ClusterError;

/// Read `path` from `container` of pod `name` by running `cat` in it.
///
/// Anything but a `Success` exec status means the file was not served.
pub(crate) async fn cat_file(
    api: &Api<Pod>,
    name: &str,
    container: &str,
    path: &str,
) -> Result<Vec<u8>, ClusterError> {
    let params = AttachParams::default()
        .container(container)
        .stdin(false)
        .stdout(true)
        .stderr(false);
    let mut process = api
        .exec(name, ["cat", path], &params)
        .await
        .map_err(|e| ClusterError::Api(format!("exec in {name}/{container}: {e}")))?;

    let mut stdout = process
        .stdout()
        .ok_or_else(|| ClusterError::ReadRefused(format!("no stdout from {name}/{container}")))?;
    let status = process.take_status();

    let mut bytes = Vec::new();
    stdout.read_to_end(&mut bytes).await?;
    drop(stdout);

    let status = match status {
        Some(status) => status.await,
        None => None,
    };
    if let Err(e) = process.join().await {
        debug!(pod = %name, error = %e, "exec session did not shut down cleanly");
    }

    match status {
        Some(s) if s.status.as_deref() == Some("Success") => Ok(bytes),
        Some(s) => Err(ClusterError::ReadRefused(format!(
            "cat {path} in {name}/{container}: {}",
            s.message.unwrap_or_else(|| "exec failed".to_string())
        ))),
        None => Err(ClusterError::ReadRefused(format!(
            "cat {path} in {name}/{container}: no exec status"
        ))),
    }
}
