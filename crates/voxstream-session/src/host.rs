use crate::session::RecognitionSession;
use tokio::sync::mpsc;
use voxstream_core::{AppConfig, AudioChunk, RecognitionError, RecognitionResult};
use voxstream_engine::ModelRegistry;

/// What a stream's producer can send to its session task.
#[derive(Debug, Clone)]
pub enum StreamInput {
    Audio(AudioChunk),
    /// End of input: flush, publish the final result and stop.
    Finish,
}

struct PendingStream {
    id: String,
    session: RecognitionSession,
    endpoint_reset: bool,
    input_rx: mpsc::UnboundedReceiver<StreamInput>,
}

/// Runs independent recognition sessions, one tokio task each, and merges
/// their results into a single channel.
pub struct SessionHost {
    streams: Vec<PendingStream>,
    result_tx: mpsc::UnboundedSender<RecognitionResult>,
    result_rx: Option<mpsc::UnboundedReceiver<RecognitionResult>>,
    task_handles: Vec<tokio::task::JoinHandle<()>>,
}

impl SessionHost {
    pub fn new() -> Self {
        let (result_tx, result_rx) = mpsc::unbounded_channel();
        Self {
            streams: Vec::new(),
            result_tx,
            result_rx: Some(result_rx),
            task_handles: Vec::new(),
        }
    }

    pub fn take_result_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<RecognitionResult>> {
        self.result_rx.take()
    }

    pub fn add_stream(
        &mut self,
        id: &str,
        config: &AppConfig,
        registry: &ModelRegistry,
    ) -> Result<mpsc::UnboundedSender<StreamInput>, RecognitionError> {
        let session = RecognitionSession::from_config(config, registry)?;
        let (input_tx, input_rx) = mpsc::unbounded_channel();

        self.streams.push(PendingStream {
            id: id.to_string(),
            session,
            endpoint_reset: config.session.endpoint_reset,
            input_rx,
        });

        Ok(input_tx)
    }

    pub fn start(&mut self) {
        let streams = std::mem::take(&mut self.streams);
        for stream in streams {
            let result_tx = self.result_tx.clone();
            let handle = tokio::spawn(run_stream(stream, result_tx));
            self.task_handles.push(handle);
        }
    }

    pub async fn shutdown(&mut self) {
        let handles = std::mem::take(&mut self.task_handles);
        for handle in handles {
            let _ = handle.await;
        }
    }
}

impl Default for SessionHost {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_stream(stream: PendingStream, result_tx: mpsc::UnboundedSender<RecognitionResult>) {
    let PendingStream {
        id,
        mut session,
        endpoint_reset,
        mut input_rx,
    } = stream;
    let mut last_text = String::new();

    let publish = |session: &RecognitionSession, text: String, is_final: bool| {
        let _ = result_tx.send(RecognitionResult {
            stream_id: id.clone(),
            text,
            is_final,
            utterance: session.utterance(),
        });
    };

    while let Some(input) = input_rx.recv().await {
        match input {
            StreamInput::Audio(chunk) => {
                if let Err(e) = session.accept_chunk(&chunk) {
                    tracing::error!(stream_id = %id, "session error: {e}");
                    return;
                }

                let text = session.text();
                if text != last_text {
                    publish(&session, text.clone(), false);
                    last_text = text;
                }

                if endpoint_reset && session.is_endpoint() {
                    if !last_text.is_empty() {
                        tracing::debug!(
                            stream_id = %id,
                            utterance = session.utterance(),
                            "endpoint detected"
                        );
                        publish(&session, std::mem::take(&mut last_text), true);
                    }
                    if let Err(e) = session.reset() {
                        tracing::error!(stream_id = %id, "session reset failed: {e}");
                        return;
                    }
                }
            }
            StreamInput::Finish => {
                match session.finish() {
                    Ok(()) => publish(&session, session.text(), true),
                    Err(e) => tracing::error!(stream_id = %id, "session finish failed: {e}"),
                }
                return;
            }
        }
    }

    tracing::debug!(stream_id = %id, "input sender dropped, abandoning session");
}
