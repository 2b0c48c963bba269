//! Run handler: probe, submit one source file, print the result.

use std::sync::Arc;

use anyhow::Result;

use crate::{
    language::Language,
    printer::TextPrinter,
    service::ExecutionService,
    session::{Notice, SessionController},
    utils::read_source,
};

/// Returns whether the code ran successfully.
pub async fn run<S>(
    service: Arc<S>,
    language: Language,
    file: Option<&str>,
    printer: &TextPrinter,
) -> Result<bool>
where
    S: ExecutionService + ?Sized,
{
    let controller = SessionController::new(service, language);
    if let Some(path) = file {
        controller.set_source(read_source(path)?);
    }

    controller.check_availability().await;
    let notice = controller.execute().await;

    if let Some(last) = controller.snapshot().last_run {
        printer.print_run(&last);
    }
    if notice != Notice::ExecutionSucceeded {
        printer.print_notice(notice);
    }
    Ok(notice == Notice::ExecutionSucceeded)
}
