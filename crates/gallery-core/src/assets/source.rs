use crate::Result;
use std::future::Future;
use std::pin::Pin;

/// Boxed, non-`Send` fetch future. Browser fetches are single-threaded.
pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>>> + 'a>>;

/// Where encoded image bytes come from.
pub trait AssetSource {
    fn fetch<'a>(&'a self, image_ref: &'a str) -> FetchFuture<'a>;
}

impl<T: AssetSource + ?Sized> AssetSource for std::rc::Rc<T> {
    fn fetch<'a>(&'a self, image_ref: &'a str) -> FetchFuture<'a> {
        (**self).fetch(image_ref)
    }
}
