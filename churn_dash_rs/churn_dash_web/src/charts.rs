use churn_dash::chart::{ChartKind, ChartSpec, ChartSurface};

#[cfg(feature = "chart_js")]
use serde::Serialize;
#[cfg(feature = "chart_js")]
use wasm_bindgen::{JsCast, JsValue};

#[cfg(feature = "chart_js")]
use crate::console_warn;

/// Charts drawn with the page's global `Chart` constructor. A handle is the
/// Chart.js instance.
#[cfg(feature = "chart_js")]
#[derive(Default)]
pub struct ChartJsSurface;

#[cfg(feature = "chart_js")]
impl ChartSurface for ChartJsSurface {
    type Handle = JsValue;

    fn create(&mut self, spec: &ChartSpec) -> Option<JsValue> {
        let document = web_sys::window()?.document()?;
        let canvas = document
            .get_element_by_id(spec.kind.canvas_id())?
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .ok()?;
        let context = canvas.get_context("2d").ok()??;

        let constructor = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("Chart"))
            .ok()
            .and_then(|v| v.dyn_into::<js_sys::Function>().ok());
        let Some(constructor) = constructor else {
            console_warn("Chart.js is not loaded; charts are skipped");
            return None;
        };

        let config = spec
            .to_chartjs_config()
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .ok()?;
        let args = js_sys::Array::of2(&context.into(), &config);
        match js_sys::Reflect::construct(&constructor, &args) {
            Ok(chart) => Some(chart),
            Err(err) => {
                console_warn(&format!("failed to create {:?} chart: {err:?}", spec.kind));
                None
            }
        }
    }

    fn update(&mut self, handle: &mut JsValue, kind: ChartKind, data: &[f64]) {
        let dataset = js_sys::Reflect::get(handle, &JsValue::from_str("data"))
            .and_then(|d| js_sys::Reflect::get(&d, &JsValue::from_str("datasets")))
            .and_then(|sets| js_sys::Reflect::get_u32(&sets, 0));
        let Ok(dataset) = dataset else {
            console_warn(&format!("{kind:?} chart has no dataset"));
            return;
        };
        let values: js_sys::Array = data.iter().map(|v| JsValue::from_f64(*v)).collect();
        js_sys::Reflect::set(&dataset, &JsValue::from_str("data"), &values).ok();
        if let Ok(redraw) = js_sys::Reflect::get(handle, &JsValue::from_str("update"))
            .and_then(|f| f.dyn_into::<js_sys::Function>().map_err(JsValue::from))
        {
            let _ = redraw.call0(handle);
        }
    }
}

/// Stand-in when the bundle is built without Chart.js support.
#[cfg(not(feature = "chart_js"))]
#[derive(Default)]
pub struct ChartJsSurface;

#[cfg(not(feature = "chart_js"))]
impl ChartSurface for ChartJsSurface {
    type Handle = ();

    fn create(&mut self, _spec: &ChartSpec) -> Option<()> {
        None
    }

    fn update(&mut self, _handle: &mut (), _kind: ChartKind, _data: &[f64]) {}
}
