use super::loader::AssetSource;
use super::stage::Texture;
use crate::browser;
use crate::error::EngineError;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::channel::oneshot;
use futures::future::{self, Either};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::HtmlImageElement;

type Settle = Rc<RefCell<Option<oneshot::Sender<Result<()>>>>>;

/// Loads textures as HTML images, giving each one `timeout_ms` before it
/// is reported as stalled.
pub struct ImageSource {
    timeout_ms: u32,
}

impl ImageSource {
    pub fn new(timeout_ms: u32) -> Self {
        ImageSource { timeout_ms }
    }

    /// Resolves once the browser has decoded `file` or given up on it.
    async fn decode(file: &str) -> Result<HtmlImageElement> {
        let image = browser::new_image()?;
        let (sender, settled) = oneshot::channel();
        let settle: Settle = Rc::new(RefCell::new(Some(sender)));

        let on_load = {
            let settle = Rc::clone(&settle);
            browser::closure_once(move || send_once(&settle, Ok(())))
        };
        let name = file.to_string();
        let on_error = browser::closure_once(move |err: JsValue| {
            let error = anyhow!("image '{}' did not decode: {:#?}", name, err);
            send_once(&settle, Err(error))
        });

        image.set_onload(Some(on_load.as_ref().unchecked_ref()));
        image.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        image.set_src(file);
        // the image element owns the handlers from here on
        on_load.forget();
        on_error.forget();

        settled
            .await
            .map_err(|_| anyhow!("image '{}' was dropped before it settled", file))??;
        Ok(image)
    }
}

// onload and onerror share one sender, only the first event gets through
fn send_once(settle: &Settle, outcome: Result<()>) {
    if let Some(sender) = settle.borrow_mut().take() {
        let _ = sender.send(outcome);
    }
}

#[async_trait(?Send)]
impl AssetSource for ImageSource {
    type Handle = Texture;

    async fn fetch(&self, file: &str) -> Result<Texture> {
        let decoded = Box::pin(Self::decode(file));
        let deadline = Box::pin(browser::sleep(self.timeout_ms));
        match future::select(decoded, deadline).await {
            Either::Left((image, _)) => image.map(Texture::new),
            Either::Right((slept, _)) => {
                slept?;
                Err(EngineError::LoadStalled {
                    file: file.to_string(),
                    after_ms: self.timeout_ms,
                }
                .into())
            }
        }
    }
}
