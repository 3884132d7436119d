use crate::clipboard::ClipboardSource;
use crate::error::ClipboardError;

/// The system clipboard, through `arboard`.
pub struct SystemClipboard {
    ctx: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        let ctx = arboard::Clipboard::new()?;
        Ok(Self { ctx })
    }
}

impl ClipboardSource for SystemClipboard {
    fn get_text(&mut self) -> Result<Option<String>, ClipboardError> {
        match self.ctx.get_text() {
            Ok(text) => Ok(Some(text)),
            // Image, file list, or nothing at all
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.ctx.set_text(text)?;
        Ok(())
    }
}
