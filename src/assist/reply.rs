//! Machine replies to task comments.

use super::Assistant;
use crate::error::ApiResult;
use crate::generation::GenerationError;
use crate::prompts::REPLY_ROLE;
use crate::types::{Comment, CommentOrigin};

impl Assistant {
    /// Generate a reply to a comment and store it as a machine comment.
    ///
    /// The comment row is written only after generation succeeds.
    pub async fn compose_reply(&self, comment_id: i64, hint: Option<&str>) -> ApiResult<Comment> {
        let context = self.db.reply_context(comment_id)?;
        let prompt = self.prompts.comment_reply(
            &context.comment,
            &context.task.name,
            context.task.description.as_deref(),
            &context.recent,
        );

        let text = self.generators.generate(hint, REPLY_ROLE, &prompt).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(GenerationError::InvalidPayload("empty reply".to_string()).into());
        }

        let reply = self
            .db
            .create_comment(context.task.id, text, CommentOrigin::Machine)?;
        tracing::info!(
            comment_id,
            reply_id = reply.id,
            task_id = context.task.id,
            "Stored machine reply"
        );
        Ok(reply)
    }
}
