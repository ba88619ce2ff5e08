use std::time::Duration;

use churn_dash::{
    ranking_csv, BulkTable, BusyControl, BusyGuard, ChartKind, ChartRenderer, ClientError,
    FormInputs, KpiView, Operation, PredictionRequest, Region, RequestSequencer, ViewMode,
    PREDICT_BUSY_LABEL, UPLOAD_BUSY_LABEL,
};
use leptos::html::Input;
use leptos::*;
use wasm_bindgen::JsValue;
use web_sys::Blob;

mod charts;
mod net;

use charts::ChartJsSurface;
use net::WebClient;

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_COMMIT: &str = env!("CHURN_DASH_COMMIT");

const AUTO_PREDICT_DELAY: Duration = Duration::from_millis(500);
const PREDICT_LABEL: &str = "Predict Risk";
const UPLOAD_LABEL: &str = "Upload & Analyze";
const EMPTY_KPI: &str = "--";

/// Element ids the dashboard stylesheet and scripts target.
mod dom_id {
    pub const TENURE: &str = "tenure";
    pub const MONTHLY_CHARGES: &str = "monthlyCharges";
    pub const TOTAL_CHARGES: &str = "totalCharges";
    pub const SENIOR_CITIZEN: &str = "seniorCitizen";
    pub const CONTRACT: &str = "contract";
    pub const GENDER: &str = "gender";
    pub const CSV_FILE: &str = "csvFile";
    pub const LAST_UPDATED: &str = "lastUpdated";
    pub const CARD_PROB: &str = "cardProb";
    pub const PROB_VALUE: &str = "probValue";
    pub const CARD_RISK: &str = "cardRisk";
    pub const RISK_VALUE: &str = "riskValue";
    pub const REASON_VALUE: &str = "reasonValue";
    pub const SUGGESTION_VALUE: &str = "suggestionValue";
    pub const TIP_VALUE: &str = "tipValue";
    pub const RANKING_TABLE_BODY: &str = "rankingTableBody";
}

pub(crate) fn console_warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

fn console_debug(message: &str) {
    web_sys::console::debug_1(&JsValue::from_str(message));
}

/// Log the detail, show the user only the static text.
fn report_failure(err: &ClientError, op: Operation) {
    web_sys::console::error_1(&JsValue::from_str(&format!("{op:?} failed: {err}")));
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(err.user_message(op));
    }
}

fn local_time() -> String {
    js_sys::Date::new_0()
        .to_locale_time_string("default")
        .into()
}

fn blob_url_from_str(s: &str) -> Option<String> {
    let parts = js_sys::Array::of1(&JsValue::from_str(s));
    let blob = Blob::new_with_str_sequence(&parts).ok()?;
    web_sys::Url::create_object_url_with_blob(&blob).ok()
}

/// Text of one KPI field, or a placeholder before the first prediction.
fn kpi_text(kpi: RwSignal<Option<KpiView>>, field: fn(&KpiView) -> String) -> impl Fn() -> String {
    move || kpi.with(|view| view.as_ref().map(field).unwrap_or_else(|| EMPTY_KPI.into()))
}

fn card_class(kpi: RwSignal<Option<KpiView>>, class: fn(&KpiView) -> String) -> impl Fn() -> String {
    move || kpi.with(|view| view.as_ref().map(class).unwrap_or_else(|| "kpi-card".into()))
}

/// Button state held in signals so the view re-renders on change.
#[derive(Clone, Copy)]
struct ButtonControl {
    label: RwSignal<String>,
    disabled: RwSignal<bool>,
}

impl ButtonControl {
    fn new(label: &str) -> Self {
        Self {
            label: create_rw_signal(label.to_string()),
            disabled: create_rw_signal(false),
        }
    }

    fn is_busy(&self) -> bool {
        self.disabled.get_untracked()
    }
}

impl BusyControl for ButtonControl {
    fn label(&self) -> String {
        self.label.get_untracked()
    }

    fn set_label(&self, label: &str) {
        self.label.set(label.to_string());
    }

    fn set_disabled(&self, disabled: bool) {
        self.disabled.set(disabled);
    }
}

/// Claims the button for one call. `None` while an earlier call still holds it.
fn begin_call(button: ButtonControl, busy_label: &str) -> Option<BusyGuard<ButtonControl>> {
    if button.is_busy() {
        return None;
    }
    Some(BusyGuard::engage(button, busy_label))
}

#[component]
pub fn App() -> impl IntoView {
    let tenure = create_rw_signal(String::from("12"));
    let monthly_charges = create_rw_signal(String::from("70.5"));
    let total_charges = create_rw_signal(String::from("846"));
    let senior_citizen = create_rw_signal(String::from("0"));
    let contract = create_rw_signal(String::from("Month-to-month"));
    let gender = create_rw_signal(String::from("Male"));

    let mode = create_rw_signal(ViewMode::Single);
    let kpi = create_rw_signal(Option::<KpiView>::None);
    let last_updated = create_rw_signal(Option::<String>::None);
    let bulk = create_rw_signal(Option::<BulkTable>::None);
    let ranking_href = create_rw_signal(String::new());

    let predict_button = ButtonControl::new(PREDICT_LABEL);
    let upload_button = ButtonControl::new(UPLOAD_LABEL);
    let file_input = create_node_ref::<Input>();

    let client = store_value(WebClient::from_build_env());
    let sequencer = store_value(RequestSequencer::new());
    let charts = store_value(ChartRenderer::new(ChartJsSurface));

    let run_prediction = move || {
        // Claimed before yielding so a second trigger in the same tick is refused.
        let Some(busy) = begin_call(predict_button, PREDICT_BUSY_LABEL) else {
            return;
        };
        let inputs = FormInputs {
            tenure: tenure.get_untracked(),
            monthly_charges: monthly_charges.get_untracked(),
            total_charges: total_charges.get_untracked(),
            senior_citizen: senior_citizen.get_untracked(),
            contract: contract.get_untracked(),
            gender: gender.get_untracked(),
        };
        let request = PredictionRequest::from_inputs(&inputs);
        let ticket = sequencer.with_value(|seq| seq.begin());
        let client = client.get_value();
        spawn_local(async move {
            let outcome = client.predict(&request).await;
            drop(busy);
            if !sequencer.with_value(|seq| seq.is_current(ticket)) {
                return;
            }
            match outcome {
                Ok(response) => {
                    kpi.set(Some(KpiView::render(&response)));
                    charts.update_value(|renderer| renderer.render(&request, response.probability));
                    last_updated.set(Some(local_time()));
                }
                Err(err) => report_failure(&err, Operation::Predict),
            }
        });
    };

    let on_upload = move |_ev: ev::MouseEvent| {
        if upload_button.is_busy() {
            return;
        }
        let file = file_input
            .get_untracked()
            .and_then(|input| input.files())
            .and_then(|files| files.item(0));
        if file.is_none() {
            report_failure(&ClientError::NoFileSelected, Operation::Upload);
            return;
        }
        let Some(busy) = begin_call(upload_button, UPLOAD_BUSY_LABEL) else {
            return;
        };
        let client = client.get_value();
        spawn_local(async move {
            let outcome = client.upload(file).await;
            drop(busy);
            match outcome {
                Ok(rows) => {
                    let table = BulkTable::render(&rows);
                    console_debug(&format!("ranked {} customers", table.len()));
                    let old = ranking_href.get_untracked();
                    if !old.is_empty() {
                        let _ = web_sys::Url::revoke_object_url(&old);
                    }
                    let href = ranking_csv(&table)
                        .ok()
                        .and_then(|csv| blob_url_from_str(&csv))
                        .unwrap_or_default();
                    ranking_href.set(href);
                    bulk.set(Some(table));
                }
                Err(err) => report_failure(&err, Operation::Upload),
            }
        });
    };

    set_timeout(run_prediction, AUTO_PREDICT_DELAY);

    view! {
        <main class="dashboard">
            <header class="top-bar">
                <h1>"Customer Churn Risk"</h1>
                <nav class="mode-switch">
                    <button id="btnSingle" class=move || mode.get().class(Region::SingleButton)
                        on:click=move |_| mode.set(ViewMode::Single)>"Single Customer"</button>
                    <button id="btnBulk" class=move || mode.get().class(Region::BulkButton)
                        on:click=move |_| mode.set(ViewMode::Bulk)>"Bulk Upload"</button>
                </nav>
            </header>

            <aside class="sidebar">
                <form id="predictionForm" style:display=move || mode.get().display(Region::PredictionForm)
                    on:submit=move |ev: ev::SubmitEvent| { ev.prevent_default(); run_prediction(); }>
                    <label>"Tenure (months)"
                        <input type="number" id={dom_id::TENURE} prop:value=move || tenure.get()
                            on:input=move |ev| tenure.set(event_target_value(&ev))/>
                    </label>
                    <label>"Monthly charges ($)"
                        <input type="number" step="0.01" id={dom_id::MONTHLY_CHARGES} prop:value=move || monthly_charges.get()
                            on:input=move |ev| monthly_charges.set(event_target_value(&ev))/>
                    </label>
                    <label>"Total charges ($)"
                        <input type="number" step="0.01" id={dom_id::TOTAL_CHARGES} prop:value=move || total_charges.get()
                            on:input=move |ev| total_charges.set(event_target_value(&ev))/>
                    </label>
                    <label>"Senior citizen"
                        <select id={dom_id::SENIOR_CITIZEN} on:change=move |ev| senior_citizen.set(event_target_value(&ev))>
                            <option value="0" selected=move || senior_citizen.get() == "0">"No"</option>
                            <option value="1" selected=move || senior_citizen.get() == "1">"Yes"</option>
                        </select>
                    </label>
                    <label>"Contract"
                        <select id={dom_id::CONTRACT} on:change=move |ev| contract.set(event_target_value(&ev))>
                            <option value="Month-to-month">"Month-to-month"</option>
                            <option value="One year">"One year"</option>
                            <option value="Two year">"Two year"</option>
                        </select>
                    </label>
                    <label>"Gender"
                        <select id={dom_id::GENDER} on:change=move |ev| gender.set(event_target_value(&ev))>
                            <option value="Male">"Male"</option>
                            <option value="Female">"Female"</option>
                        </select>
                    </label>
                    <button type="submit" class="btn" disabled=move || predict_button.disabled.get()>
                        {move || predict_button.label.get()}
                    </button>
                </form>

                <div id="bulkForm" style:display=move || mode.get().display(Region::BulkForm)>
                    <input type="file" id={dom_id::CSV_FILE} accept=".csv" node_ref=file_input/>
                    <button class="btn" on:click=on_upload disabled=move || upload_button.disabled.get()>
                        {move || upload_button.label.get()}
                    </button>
                </div>
            </aside>

            <section class="content">
                <div class="section-header" style:display=move || mode.get().display(Region::SectionHeader)>
                    <h2>"Risk overview"</h2>
                    <span class="note">"Last updated: "<span id={dom_id::LAST_UPDATED}>{move || last_updated.get().unwrap_or_else(|| EMPTY_KPI.into())}</span></span>
                </div>

                <div class="kpi-row" style:display=move || mode.get().display(Region::KpiRow)>
                    <div id={dom_id::CARD_PROB} class=card_class(kpi, KpiView::probability_card_class)>
                        <span class="kpi-label">"Churn probability"</span>
                        <span id={dom_id::PROB_VALUE} class="kpi-value">{kpi_text(kpi, |v| v.probability_text.clone())}</span>
                    </div>
                    <div id={dom_id::CARD_RISK} class=card_class(kpi, KpiView::risk_card_class)>
                        <span class="kpi-label">"Risk level"</span>
                        <span id={dom_id::RISK_VALUE} class="kpi-value">{kpi_text(kpi, |v| v.risk_text.clone())}</span>
                    </div>
                    <div class="kpi-card">
                        <span class="kpi-label">"Top reason"</span>
                        <span id={dom_id::REASON_VALUE} class="kpi-value">{kpi_text(kpi, |v| v.reason_text.clone())}</span>
                    </div>
                    <div class="kpi-card">
                        <span class="kpi-label">"Suggestion"</span>
                        <span id={dom_id::SUGGESTION_VALUE} class="kpi-value">{kpi_text(kpi, |v| v.suggestion_text.clone())}</span>
                        <span id={dom_id::TIP_VALUE} class="note">{kpi_text(kpi, |v| v.tip_text.clone())}</span>
                    </div>
                </div>

                <div class="charts-row" style:display=move || mode.get().display(Region::ChartsRow)>
                    <div class="chart-box"><canvas id={ChartKind::Usage.canvas_id()}></canvas></div>
                    <div class="chart-box"><canvas id={ChartKind::Risk.canvas_id()}></canvas></div>
                </div>

                <div id="bulkResults" style:display=move || mode.get().display(Region::BulkResults)>
                    <table class="ranking">
                        <thead>
                            <tr><th>"Rank"</th><th>"Customer"</th><th>"Probability"</th><th>"Risk"</th><th>"Top reason"</th></tr>
                        </thead>
                        <tbody id={dom_id::RANKING_TABLE_BODY}>
                            {move || bulk.get().map(|table| table.rows.into_iter().map(|row| view! {
                                <tr>
                                    <td>{row.rank_label()}</td>
                                    <td>{row.customer_id}</td>
                                    <td>{row.probability_text}</td>
                                    <td><span class="badge" style:background-color=row.badge_color>{row.risk}</span></td>
                                    <td>{row.top_reason}</td>
                                </tr>
                            }).collect_view())}
                        </tbody>
                    </table>
                    <a id="dl_ranking" href=move || ranking_href.get() download="ranking.csv"
                        style=move || if ranking_href.get().is_empty() {"display:none;"} else {"display:inline;"}>"Download ranking.csv"</a>
                </div>
            </section>

            <footer class="note">{"Web version "}{APP_VERSION}{" ("}{APP_COMMIT}{")"}</footer>
        </main>
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    leptos::mount_to_body(|| view! { <App/> });
}
