use super::orchestrator::GoCaptureApp;
use super::types::RunMode;
use crate::capture::{
    adapter_from_config, CaptureAdapter, PermissionGate, PhotoCapture, StoragePermission,
    TempStore,
};
use crate::config::GoCaptureConfig;
use crate::error::{GoCaptureError, Result};
use crate::events;
use crate::navigator::{BrowserNavigator, Navigator};
use crate::remote::RemoteClient;
use crate::session::Session;
use crate::ui::{KeyboardInputHandler, LogRenderer, Renderer, TerminalRenderer};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Builder for the app; collaborators left unset are created from the configuration
pub struct GoCaptureAppBuilder {
    config: Option<GoCaptureConfig>,
    mode: RunMode,
    adapter: Option<Arc<dyn CaptureAdapter>>,
    navigator: Option<Arc<dyn Navigator>>,
    permission: Option<Arc<dyn PermissionGate>>,
    renderer: Option<Box<dyn Renderer>>,
}

impl GoCaptureAppBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            mode: RunMode::Interactive,
            adapter: None,
            navigator: None,
            permission: None,
            renderer: None,
        }
    }

    pub fn config(mut self, config: GoCaptureConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn capture_adapter(mut self, adapter: Arc<dyn CaptureAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn permission(mut self, permission: Arc<dyn PermissionGate>) -> Self {
        self.permission = Some(permission);
        self
    }

    pub fn renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn build(self) -> Result<GoCaptureApp> {
        let config = self
            .config
            .ok_or_else(|| GoCaptureError::system("App configuration must be specified"))?;

        let interactive = config.ui.interactive && self.mode == RunMode::Interactive;
        let app_dir = config.capture.app_dir();

        let adapter = self
            .adapter
            .unwrap_or_else(|| adapter_from_config(&config.capture));
        let capture = PhotoCapture::new(adapter, TempStore::new(app_dir.clone()));
        let client = RemoteClient::new(config.remote.clone())?;
        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(BrowserNavigator::new(&config.browser)));
        let permission = self
            .permission
            .unwrap_or_else(|| Arc::new(StoragePermission::new(app_dir)));
        let renderer: Box<dyn Renderer> = match self.renderer {
            Some(renderer) => renderer,
            None if interactive => Box::new(TerminalRenderer::new()?),
            None => Box::new(LogRenderer::new()),
        };

        let (sender, receiver) = events::channel(EVENT_CHANNEL_CAPACITY);
        let cancellation_token = CancellationToken::new();
        let keyboard = interactive
            .then(|| KeyboardInputHandler::new(sender.clone(), cancellation_token.child_token()));

        Ok(GoCaptureApp {
            config,
            mode: self.mode,
            session: Session::new(),
            capture,
            client,
            navigator,
            permission,
            renderer,
            keyboard,
            events: sender,
            receiver: Some(receiver),
            notification: None,
            request: None,
            capture_in_progress: false,
            permission_notified: false,
            cancellation_token,
        })
    }
}

impl Default for GoCaptureAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GoCaptureApp {
    pub fn builder() -> GoCaptureAppBuilder {
        GoCaptureAppBuilder::new()
    }
}
