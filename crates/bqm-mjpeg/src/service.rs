//! Lifecycle wrapper tying the frame generator and the TCP server
//! together: lazily build the pieces, refuse to start with an empty
//! album, and tear every background task down on stop.

use std::sync::Arc;

use bqm_core::{InfoProvider, PreviewLoader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::error::MjpegError;
use crate::frame::FrameGenerator;
use crate::server::MjpegServer;
use crate::settings::MjpegStreamSettings;

pub struct MjpegServiceHandle {
    server: Arc<MjpegServer>,
    tasks: Vec<JoinHandle<()>>,
    pub start_at_startup: bool,
}

impl MjpegServiceHandle {
    pub fn new(start_at_startup: bool) -> Self {
        MjpegServiceHandle { server: Arc::new(MjpegServer::new(0, Vec::new())), tasks: Vec::new(), start_at_startup }
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Starts the generator loop and the TCP accept/broadcast loops.
    /// Refuses to start when the album collection is empty.
    pub async fn start(
        &mut self,
        settings: MjpegStreamSettings,
        preview_loader: Arc<dyn PreviewLoader>,
        info_provider: Arc<dyn InfoProvider>,
    ) -> Result<(), MjpegError> {
        if self.is_running() {
            return Err(MjpegError::AlreadyRunning);
        }
        if settings.input_images.is_empty() {
            return Err(MjpegError::NoAlbums);
        }

        let listener = TcpListener::bind(("0.0.0.0", settings.port)).await?;
        let server = Arc::new(MjpegServer::new(settings.max_clients, settings.black_list.clone()));
        let delay = settings.frame_delay();
        let generator = Arc::new(FrameGenerator::new(settings, preview_loader, info_provider));

        self.server = server.clone();

        let accept_server = server.clone();
        let accept_task = tokio::spawn(async move {
            if let Err(err) = accept_server.accept_loop(listener).await {
                tracing::error!(error = %err, "mjpeg accept loop exited");
            }
        });

        let broadcast_server = server.clone();
        let broadcast_task = tokio::spawn(async move {
            broadcast_server.broadcast_loop(delay).await;
        });

        let generator_server = server.clone();
        let generate_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(delay);
            loop {
                ticker.tick().await;
                match generator.next_frame() {
                    Ok(Some(jpeg)) => generator_server.write_frame(jpeg).await,
                    Ok(None) => break,
                    Err(err) => {
                        tracing::error!(error = %err, "mjpeg frame generation failed");
                        break;
                    }
                }
            }
        });

        self.tasks = vec![accept_task, broadcast_task, generate_task];
        Ok(())
    }

    pub fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    pub async fn client_count(&self) -> usize {
        self.server.client_count().await
    }
}

impl Drop for MjpegServiceHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
