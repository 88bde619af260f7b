use crate::error::AssignmentError;
use coach_assignment_infra::AssignmentContext;
use std::fmt::Debug;
use tracing::error;

#[async_trait::async_trait(?Send)]
pub trait UseCase: Debug {
    type Response;
    type Error: Debug;

    const NAME: &'static str;

    async fn execute(&mut self, ctx: &AssignmentContext) -> Result<Self::Response, Self::Error>;
}

/// Runs the `UseCase` under the request deadline. Dropping the use case
/// future on timeout also drops every downstream call it has in flight.
#[tracing::instrument(name = "Executing usecase", skip(usecase, ctx), fields(usecase = U::NAME))]
pub async fn execute<U>(mut usecase: U, ctx: &AssignmentContext) -> Result<U::Response, AssignmentError>
where
    U: UseCase,
    AssignmentError: From<U::Error>,
{
    let deadline = ctx.config.request_timeout;
    let res = match tokio::time::timeout(deadline, usecase.execute(ctx)).await {
        Ok(res) => res,
        Err(_) => {
            error!("Use case {} exceeded the request deadline of {:?}", U::NAME, deadline);
            return Err(AssignmentError::DeadlineExceeded(deadline.as_secs()));
        }
    };

    if let Err(e) = &res {
        error!("Use case error: {:?}", e);
    }

    res.map_err(AssignmentError::from)
}
