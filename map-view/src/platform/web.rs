//! Platform specific stuff for WASM32 (web) targets.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use futures::channel::mpsc::{self, UnboundedSender};
use futures::StreamExt;
use js_sys::{Array, Function, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlScriptElement, Window};
use web_time::Instant;

use crate::config::{MapOptions, MapViewConfig, MarkerOptions};
use crate::error::HostError;
use crate::host::{HostEvent, MapHost, ScriptId, TimerId};
use crate::render::{BannerChange, BannerModel, OverlayModel, ViewModel};
use crate::view::{MapView, Phase};

enum TimerKind {
    Interval,
    Timeout,
}

struct BrowserTimer {
    handle: i32,
    kind: TimerKind,
    _callback: Closure<dyn FnMut()>,
}

/// [`MapHost`] backed by the browser DOM.
///
/// Timer ticks and the script error are sent into a channel as [`HostEvent`]s. Browser callbacks
/// never touch the view directly.
pub struct WebHost {
    window: Window,
    document: Document,
    root: HtmlElement,
    container: Option<HtmlElement>,
    mount_node: Option<HtmlElement>,
    banner: Option<HtmlElement>,
    map: Option<JsValue>,
    script: Option<HtmlScriptElement>,
    script_error_callback: Option<Closure<dyn FnMut()>>,
    timers: HashMap<TimerId, BrowserTimer>,
    events: UnboundedSender<HostEvent>,
}

impl WebHost {
    /// Creates a host rendering into `root`.
    pub fn new(root: HtmlElement, events: UnboundedSender<HostEvent>) -> Result<Self, HostError> {
        let window = web_sys::window().ok_or(HostError::NotFound("window"))?;
        let document = window.document().ok_or(HostError::NotFound("document"))?;

        Ok(Self {
            window,
            document,
            root,
            container: None,
            mount_node: None,
            banner: None,
            map: None,
            script: None,
            script_error_callback: None,
            timers: HashMap::new(),
            events,
        })
    }

    /// Removes the rendered view from the page and stops delivering events.
    pub fn detach(&mut self) {
        if let Some(container) = self.container.take() {
            container.remove();
        }
        self.mount_node = None;
        self.banner = None;
        self.map = None;
        self.events.close_channel();
    }

    fn create_element(&self, tag: &str) -> Result<HtmlElement, HostError> {
        Ok(self.document.create_element(tag)?.dyn_into::<HtmlElement>()?)
    }

    fn start_timer(&mut self, delay: Duration, kind: TimerKind) -> Result<TimerId, HostError> {
        let id = TimerId::next();
        let events = self.events.clone();
        let callback: Closure<dyn FnMut()> =
            Closure::new(move || send_event(&events, HostEvent::Timer(id)));

        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        let function: &Function = callback.as_ref().unchecked_ref();
        let handle = match kind {
            TimerKind::Interval => self
                .window
                .set_interval_with_callback_and_timeout_and_arguments_0(function, millis)?,
            TimerKind::Timeout => self
                .window
                .set_timeout_with_callback_and_timeout_and_arguments_0(function, millis)?,
        };

        self.timers.insert(
            id,
            BrowserTimer {
                handle,
                kind,
                _callback: callback,
            },
        );

        Ok(id)
    }

    fn try_render(&mut self, view: &ViewModel) -> Result<(), HostError> {
        let container = match self.container.clone() {
            Some(container) => container,
            None => {
                let container = self.create_element("div")?;
                let mount_node = self.create_element("div")?;
                container.append_child(&mount_node)?;
                self.root.append_child(&container)?;

                self.mount_node = Some(mount_node);
                self.container = Some(container.clone());
                container
            }
        };

        container.set_attribute("style", &view.container.to_css())?;
        if let Some(mount_node) = &self.mount_node {
            mount_node.set_attribute("style", &view.mount_node.to_css())?;
        }

        match BannerChange::between(self.banner.is_some(), view) {
            BannerChange::Insert(model) => {
                let banner = self.create_element("div")?;
                container.insert_before(&banner, container.first_child().as_ref())?;
                apply_banner(&banner, model)?;
                self.banner = Some(banner);
            }
            BannerChange::Update(model) => {
                if let Some(banner) = &self.banner {
                    apply_banner(banner, model)?;
                }
            }
            BannerChange::Remove => {
                if let Some(banner) = self.banner.take() {
                    banner.remove();
                }
            }
            BannerChange::Keep => {}
        }

        Ok(())
    }
}

impl Drop for WebHost {
    fn drop(&mut self) {
        if let Some(script) = &self.script {
            script.set_onerror(None);
        }

        let ids: Vec<TimerId> = self.timers.keys().copied().collect();
        for id in ids {
            self.cancel_timer(id);
        }
    }
}

fn apply_banner(banner: &HtmlElement, model: &BannerModel) -> Result<(), HostError> {
    banner.set_attribute("style", &model.style.to_css())?;
    banner.set_text_content(Some(&model.text));
    Ok(())
}

fn send_event(events: &UnboundedSender<HostEvent>, event: HostEvent) {
    if let Err(err) = events.unbounded_send(event) {
        log::debug!("Dropping {event:?}: {err}");
    }
}

fn global_path(path: &[&str]) -> Option<JsValue> {
    let mut current: JsValue = js_sys::global().into();
    for name in path {
        let next = Reflect::get(&current, &JsValue::from_str(name)).ok()?;
        if next.is_undefined() || next.is_null() {
            return None;
        }
        current = next;
    }

    Some(current)
}

fn constructor(namespace: &[&str], name: &str) -> Result<Function, HostError> {
    let namespace = global_path(namespace).ok_or(HostError::NotFound("map library"))?;
    Reflect::get(&namespace, &JsValue::from_str(name))?
        .dyn_into::<Function>()
        .map_err(|_| HostError::Generic(format!("{name} is not a constructor")))
}

impl MapHost for WebHost {
    fn remove_scripts(&mut self, domain: &str) -> usize {
        let selector = format!("script[src*=\"{domain}\"]");
        let scripts = match self.document.query_selector_all(&selector) {
            Ok(scripts) => scripts,
            Err(err) => {
                log::warn!("Failed to query scripts with {selector}: {err:?}");
                return 0;
            }
        };

        let mut removed = 0;
        for index in 0..scripts.length() {
            let Some(node) = scripts.item(index) else {
                continue;
            };
            if let Ok(element) = node.dyn_into::<Element>() {
                if let Some(script) = element.dyn_ref::<HtmlElement>() {
                    script.set_onerror(None);
                }
                element.remove();
                removed += 1;
            }
        }

        if removed > 0 {
            self.script = None;
            self.script_error_callback = None;
        }

        removed
    }

    fn delete_global(&mut self, name: &str) -> bool {
        let global = js_sys::global();
        let key = JsValue::from_str(name);
        match Reflect::has(&global, &key) {
            Ok(true) => Reflect::delete_property(&global, &key).unwrap_or(false),
            _ => false,
        }
    }

    fn has_global(&self, path: &[&str]) -> bool {
        global_path(path).is_some()
    }

    fn inject_script(&mut self, src: &str) -> Result<ScriptId, HostError> {
        let id = ScriptId::next();
        let script = self
            .document
            .create_element("script")?
            .dyn_into::<HtmlScriptElement>()?;
        script.set_src(src);
        script.set_async(true);

        let events = self.events.clone();
        let callback: Closure<dyn FnMut()> =
            Closure::new(move || send_event(&events, HostEvent::ScriptError(id)));
        script.set_onerror(Some(callback.as_ref().unchecked_ref()));

        let head = self
            .document
            .head()
            .ok_or(HostError::NotFound("document head"))?;
        head.append_child(&script)?;

        self.script = Some(script);
        self.script_error_callback = Some(callback);

        Ok(id)
    }

    fn show_overlay(&mut self, overlay: &OverlayModel) -> Result<(), HostError> {
        let element = self.create_element("div")?;
        element.set_id(overlay.id);
        element.set_attribute("style", &overlay.style.to_css())?;
        element.set_text_content(Some(&overlay.text));

        let body = self
            .document
            .body()
            .ok_or(HostError::NotFound("document body"))?;
        body.append_child(&element)?;

        Ok(())
    }

    fn remove_overlay(&mut self, id: &str) -> bool {
        match self.document.get_element_by_id(id) {
            Some(element) => {
                element.remove();
                true
            }
            None => false,
        }
    }

    fn start_interval(&mut self, period: Duration) -> Result<TimerId, HostError> {
        self.start_timer(period, TimerKind::Interval)
    }

    fn start_timeout(&mut self, delay: Duration) -> Result<TimerId, HostError> {
        self.start_timer(delay, TimerKind::Timeout)
    }

    fn cancel_timer(&mut self, id: TimerId) {
        let Some(timer) = self.timers.remove(&id) else {
            return;
        };

        match timer.kind {
            TimerKind::Interval => self.window.clear_interval_with_handle(timer.handle),
            TimerKind::Timeout => self.window.clear_timeout_with_handle(timer.handle),
        }
    }

    fn has_mount_node(&self) -> bool {
        self.mount_node.is_some()
    }

    fn create_map(&mut self, namespace: &[&str], options: &MapOptions) -> Result<(), HostError> {
        let mount_node = self
            .mount_node
            .as_ref()
            .ok_or(HostError::NotFound("mount node"))?;
        let constructor = constructor(namespace, "Map")?;
        let options = serde_wasm_bindgen::to_value(options)?;

        let map = Reflect::construct(&constructor, &Array::of2(mount_node, &options))?;
        self.map = Some(map);

        Ok(())
    }

    fn create_marker(
        &mut self,
        namespace: &[&str],
        options: &MarkerOptions,
    ) -> Result<(), HostError> {
        let map = self.map.as_ref().ok_or(HostError::NotFound("map"))?;
        let constructor = constructor(namespace, "Marker")?;
        let options = serde_wasm_bindgen::to_value(options)?;
        Reflect::set(&options, &JsValue::from_str("map"), map)?;

        Reflect::construct(&constructor, &Array::of1(&options))?;

        Ok(())
    }

    fn render(&mut self, view: &ViewModel) {
        if let Err(err) = self.try_render(view) {
            log::error!("Failed to render map view: {err}");
        }
    }
}

impl From<HostError> for JsValue {
    fn from(value: HostError) -> Self {
        js_sys::Error::new(&value.to_string()).into()
    }
}

/// Map view mounted into a page element. Dropping the handle unmounts the view.
#[wasm_bindgen]
pub struct MountedMapView {
    view: Rc<RefCell<MapView<WebHost>>>,
}

#[wasm_bindgen]
impl MountedMapView {
    /// Stops loading, removes the loading overlay and the map container.
    pub fn unmount(&self) {
        let mut view = self.view.borrow_mut();
        if !view.is_mounted() {
            return;
        }

        view.unmount();
        view.host_mut().detach();
        log::debug!("Map view is unmounted");
    }

    /// Returns `true` if the map is shown.
    #[wasm_bindgen(js_name = isReady)]
    pub fn is_ready(&self) -> bool {
        *self.view.borrow().phase() == Phase::Ready
    }

    /// Text of the error banner, if loading failed.
    #[wasm_bindgen(js_name = errorMessage)]
    pub fn error_message(&self) -> Option<String> {
        self.view.borrow().error_message()
    }
}

impl Drop for MountedMapView {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Mounts the map view with default configuration into the element with the given id.
#[wasm_bindgen(js_name = mountMapView)]
pub fn mount_map_view(container_id: &str) -> Result<MountedMapView, JsValue> {
    Ok(mount_with_config(container_id, MapViewConfig::default())?)
}

/// Mounts the map view into the element with the given id.
pub fn mount_with_config(
    container_id: &str,
    config: MapViewConfig,
) -> Result<MountedMapView, HostError> {
    let document = web_sys::window()
        .and_then(|window| window.document())
        .ok_or(HostError::NotFound("document"))?;
    let root = document
        .get_element_by_id(container_id)
        .ok_or(HostError::NotFound("map container"))?
        .dyn_into::<HtmlElement>()?;

    let (sender, mut receiver) = mpsc::unbounded();
    let host = WebHost::new(root, sender)?;
    let view = Rc::new(RefCell::new(MapView::new(host, config)));

    let started = Instant::now();
    view.borrow_mut().mount();

    let task_view = view.clone();
    wasm_bindgen_futures::spawn_local(async move {
        while let Some(event) = receiver.next().await {
            let mut view = task_view.borrow_mut();
            let was_terminal = view.phase().is_terminal();
            view.handle_event(event);

            if !was_terminal && view.phase().is_terminal() {
                log::info!(
                    "Map loading finished in {:?}: {:?}",
                    started.elapsed(),
                    view.phase()
                );
            }
        }

        log::debug!("Map view event loop is stopped");
    });

    Ok(MountedMapView { view })
}
