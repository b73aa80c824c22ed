use reqwest_middleware::{ClientWithMiddleware as Client, RequestBuilder};

pub(crate) fn build(base_url: &str, client: &Client, resource: &str) -> RequestBuilder {
    let url = format!("{base_url}/{resource}");
    tracing::trace!("get service account url={url}");
    client.get(url)
}
