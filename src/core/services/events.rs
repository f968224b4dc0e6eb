use crm_kanban_core::BoardChanged;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{EventSource, MessageEvent};

/// Live `board-changed` subscription. Closing happens on drop.
pub struct BoardEvents {
    source: EventSource,
    _listener: Closure<dyn FnMut(MessageEvent)>,
}

impl BoardEvents {
    pub fn subscribe(url: &str, on_change: impl Fn(BoardChanged) + 'static) -> Result<Self, JsValue> {
        let source = EventSource::new(url)?;
        let listener = Closure::<dyn FnMut(MessageEvent)>::new(move |ev: MessageEvent| {
            let Some(text) = ev.data().as_string() else {
                return;
            };
            match serde_json::from_str::<BoardChanged>(&text) {
                Ok(change) => on_change(change),
                Err(e) => log::warn!("Unreadable {} event: {}", BoardChanged::EVENT, e),
            }
        });
        source.add_event_listener_with_callback(BoardChanged::EVENT, listener.as_ref().unchecked_ref())?;
        log::debug!("Subscribed to board events at {}", url);
        Ok(Self {
            source,
            _listener: listener,
        })
    }
}

impl Drop for BoardEvents {
    fn drop(&mut self) {
        self.source.close();
    }
}
