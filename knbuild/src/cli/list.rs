use super::ClusterArgs;
use crate::{kubectl, Result};

pub fn list(cluster: &ClusterArgs) -> Result<()> {
    use comfy_table::{Attribute, Cell, ContentArrangement, Table};

    let kubectl = cluster.kubectl();
    let namespace = cluster.namespace(&kubectl)?;

    let mut build_runs = kubectl.build_runs(&namespace)?;
    build_runs.sort_by(|a, b| {
        a.metadata
            .creation_timestamp
            .cmp(&b.metadata.creation_timestamp)
            .reverse()
    });

    // The `Accessor` type and `accessor` function aid type inference. Without them, every closure
    // in the array below would have its own unique type.
    type Accessor = fn(&kubectl::BuildRun) -> Result<Option<String>>;

    fn accessor(f: Accessor) -> Accessor {
        f
    }

    fn format_date(value: time::OffsetDateTime) -> Result<String> {
        let fd = time::macros::format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        Ok(value.to_offset(time::UtcOffset::UTC).format(fd)?)
    }

    /// Time spent building so far, or in total once completed.
    fn duration(build_run: &kubectl::BuildRun) -> Option<String> {
        let status = &build_run.status;
        let start = status.start_time?;
        let end = status
            .completion_time
            .unwrap_or_else(time::OffsetDateTime::now_utc);
        let seconds = (end - start).whole_seconds().max(0);
        Some(format!("{}m{:02}s", seconds / 60, seconds % 60))
    }

    fn status(build_run: &kubectl::BuildRun) -> Option<String> {
        build_run
            .status
            .conditions
            .iter()
            .find(|condition| condition.r#type == "Succeeded")
            .map(|condition| match &condition.reason {
                Some(reason) => format!("{}: {reason}", &condition.status),
                None => condition.status.clone(),
            })
    }

    let columns = [
        (
            "name",
            accessor(|build_run| Ok(Some(build_run.metadata.name.clone()))),
        ),
        (
            "build",
            accessor(|build_run| {
                Ok(build_run
                    .spec
                    .build_ref
                    .as_ref()
                    .map(|build_ref| build_ref.name.clone()))
            }),
        ),
        ("status", accessor(|build_run| Ok(status(build_run)))),
        (
            "created (UTC)",
            accessor(|build_run| Ok(Some(format_date(build_run.metadata.creation_timestamp)?))),
        ),
        ("duration", accessor(|build_run| Ok(duration(build_run)))),
        (
            "submitted by",
            accessor(|build_run| {
                Ok(super::common::submitted_by(&build_run.metadata).map(str::to_string))
            }),
        ),
    ];

    let (column_names, accessors): (Vec<_>, Vec<_>) = columns.into_iter().unzip();

    let mut table = Table::new();
    table
        .load_preset(comfy_table::presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            column_names
                .into_iter()
                .map(|name| Cell::new(name).add_attribute(Attribute::Bold)),
        );

    for build_run in &build_runs {
        // Collect first so errors are surfaced before the row is added.
        table.add_row({
            accessors
                .iter()
                .map(|f| f(build_run))
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .map(|value| value.unwrap_or_default())
        });
    }

    println!("{table}");

    Ok(())
}
