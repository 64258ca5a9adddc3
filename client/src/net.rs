use wasm_bindgen::JsValue;
use web_sys::Window;

/// Control endpoint, derived from the hosting page's origin. The duplex
/// scheme follows the page's own: `https:` pages get `wss`.
pub fn websocket_url(window: &Window) -> Result<String, JsValue> {
    let location = window.location();
    let protocol = location.protocol()?;
    let host = location.host()?;
    let scheme = if protocol == "https:" { "wss" } else { "ws" };
    Ok(format!("{scheme}://{host}/ws"))
}
