//! Request routing
//!
//! Picks the handler for each request by its label.

use crate::crawler::handlers::{
    CrawlContext, HandlerError, ProfileHandler, SkipHandler, WebsiteHandler,
};
use crate::crawler::request::{RequestDescriptor, RequestLabel};

/// Dispatches each request to the handler for its label
///
/// Routing itself holds no crawl state; any error comes from the handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct Router {
    profile: ProfileHandler,
    website: WebsiteHandler,
    fallback: SkipHandler,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn dispatch(
        &self,
        request: &RequestDescriptor,
        ctx: &CrawlContext,
    ) -> Result<(), HandlerError> {
        match request.label {
            RequestLabel::ProfileVisit => self.profile.handle(request, ctx).await,
            RequestLabel::WebsiteVisit => self.website.handle(request, ctx).await,
            RequestLabel::Skip => {
                self.fallback.handle(request, ctx);
                Ok(())
            }
        }
    }
}
