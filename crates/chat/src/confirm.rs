//! The confirmation / data-fetch step.
//!
//! A staged request only touches the network here, after the user's
//! explicit confirmation. The work runs on a detached task with no join
//! handle and no cancellation: the caller gets two view streams back
//! immediately and the task finishes on its own schedule.

use graphchat_core::message::{ChatHandle, Message};
use graphchat_core::stream::{self, StreamHandle};
use graphchat_core::view::View;
use tracing::{debug, warn};

use crate::engine::ChatEngine;

/// The two live views a confirmation produces: the in-place progress of
/// the staged-request card, and the out-of-band system note appended to
/// the conversation.
pub struct ConfirmHandles {
    pub progress: StreamHandle<View>,
    pub note: StreamHandle<View>,
}

impl ChatEngine {
    /// Confirm a staged GraphQL request and run the fetch.
    ///
    /// Exactly one `system` message lands in the transcript per call,
    /// whatever the fetch outcome.
    pub fn confirm_request(
        &self,
        chat: &ChatHandle,
        graphql_query: String,
        protocol: String,
    ) -> ConfirmHandles {
        let (progress_writer, progress) = stream::channel::<View>();
        let (note_writer, note) = stream::channel::<View>();

        progress_writer.update(View::Pending {
            text: format!("Calling {protocol}..."),
        });

        let engine = self.clone();
        let chat = chat.clone();

        // Fire and forget: nothing retains the join handle
        tokio::spawn(async move {
            // Pacing delay from fetch.delay_ms, matching the staged-request UI
            tokio::time::sleep(engine.confirm_delay).await;

            progress_writer.update(View::Pending {
                text: format!("Calling {protocol}... working on it..."),
            });

            let result = engine.subgraph.fetch(&protocol, &graphql_query).await;
            debug!(chat_id = %chat.id(), protocol = %protocol, ok = result.is_some(), "Confirmed fetch finished");

            let annotation = if result.is_none() && engine.report_failures {
                progress_writer.done(View::Error {
                    message: format!("Call to {protocol} failed"),
                });
                note_writer.done(View::SystemNote {
                    text: format!("Call to {protocol} failed; no data was returned."),
                });
                format!("[GraphQL request to {protocol} failed: no result]")
            } else {
                // Default policy keeps the success framing even for a null
                // result, as the staged-request flow always has
                let serialized = match serde_json::to_string(&result) {
                    Ok(s) => s,
                    Err(e) => {
                        warn!(error = %e, "Could not serialize fetch result");
                        "null".to_string()
                    }
                };
                progress_writer.done(View::AssistantText {
                    text: format!("You have successfully called {protocol}"),
                });
                note_writer.done(View::SystemNote {
                    text: format!(
                        "You have successfully called {protocol} Result: {serialized}"
                    ),
                });
                format!("[Resulting GraphQL Request: {serialized}]")
            };

            chat.append(Message::system(annotation)).await;
            engine.persist(&chat).await;
        });

        ConfirmHandles { progress, note }
    }
}
