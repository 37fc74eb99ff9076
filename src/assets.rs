use gallery_core::{AssetSource, FetchFuture, GalleryError};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

/// Image bytes over `window.fetch`.
#[derive(Default)]
pub struct FetchSource;

fn js_reason(e: wasm_bindgen::JsValue) -> String {
    e.as_string().unwrap_or_else(|| format!("{e:?}"))
}

impl AssetSource for FetchSource {
    fn fetch<'a>(&'a self, image_ref: &'a str) -> FetchFuture<'a> {
        Box::pin(async move {
            let window = web::window().ok_or_else(|| GalleryError::fetch(image_ref, "no window"))?;
            let resp = JsFuture::from(window.fetch_with_str(image_ref))
                .await
                .map_err(|e| GalleryError::fetch(image_ref, js_reason(e)))?;
            let resp: web::Response = resp
                .dyn_into()
                .map_err(|_| GalleryError::fetch(image_ref, "not a Response"))?;
            if !resp.ok() {
                return Err(GalleryError::fetch(image_ref, format!("HTTP {}", resp.status())));
            }
            let body = resp
                .array_buffer()
                .map_err(|e| GalleryError::fetch(image_ref, js_reason(e)))?;
            let buf = JsFuture::from(body)
                .await
                .map_err(|e| GalleryError::fetch(image_ref, js_reason(e)))?;
            Ok(js_sys::Uint8Array::new(&buf).to_vec())
        })
    }
}
