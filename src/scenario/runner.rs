use crate::generator::TrafficGenerator;
use crate::instrument::{DropTracer, Recorder, WindowTracer};
use crate::link::{Link, Route};
use crate::metrics::RunTimer;
use crate::scenario::config::ScenarioConfig;
use crate::scenario::error::{ScenarioError, ScenarioResult};
use crate::scenario::types::{FlowReport, LinkReport, ScenarioReport};
use crate::sim::{Scheduler, SimTime};
use crate::transport::SimSocket;
use std::collections::HashMap;
use std::sync::Arc;

struct FlowHandle {
    generator: Arc<TrafficGenerator>,
    socket: Arc<SimSocket>,
    tracer: Option<Arc<WindowTracer>>,
}

struct LinkHandle {
    link: Arc<Link>,
    tracer: Option<Arc<DropTracer>>,
}

/// Build the topology described by `config`, run it to its stop time and
/// report what happened. Samples go to `recorder` as they occur.
pub fn run_scenario(
    config: &ScenarioConfig,
    recorder: Arc<dyn Recorder>,
) -> ScenarioResult<ScenarioReport> {
    config.validate()?;

    let timer = RunTimer::start();
    let scheduler = Scheduler::new();
    scheduler.stop_at(SimTime::from_secs_f64(config.stop_secs));

    let mut links = Vec::with_capacity(config.links.len());
    let mut by_name = HashMap::new();
    for (index, link_config) in config.links.iter().enumerate() {
        let link = Link::new(link_config, config.seed.wrapping_add(index as u64));
        let tracer = link_config.trace_drops.then(|| {
            let tracer = DropTracer::new(&link_config.name, scheduler.clone(), recorder.clone());
            tracer.attach(&link);
            tracer
        });
        by_name.insert(link_config.name.as_str(), Arc::clone(&link));
        links.push(LinkHandle { link, tracer });
    }

    let mut flows = Vec::with_capacity(config.flows.len());
    for flow in &config.flows {
        let hops = flow
            .route
            .iter()
            .map(|name| {
                by_name
                    .get(name.as_str())
                    .cloned()
                    .ok_or_else(|| ScenarioError::UnknownLink {
                        flow: flow.name.clone(),
                        link: name.clone(),
                    })
            })
            .collect::<ScenarioResult<Vec<_>>>()?;
        let route = Route::new(hops)
            .ok_or_else(|| ScenarioError::Invalid(format!("flow {} has no hops", flow.name)))?;

        let socket = SimSocket::new(
            &flow.name,
            flow.local_ip,
            scheduler.clone(),
            route,
            flow.window.build(flow.message_size),
        );
        let tracer = flow.trace_window.then(|| {
            let tracer = WindowTracer::new(&flow.name, scheduler.clone(), recorder.clone());
            tracer.attach(&*socket);
            tracer
        });

        let generator =
            TrafficGenerator::with_policy(&flow.name, scheduler.clone(), flow.failure_policy);
        generator
            .configure(
                socket.clone(),
                flow.destination,
                flow.message_size,
                flow.quota,
                flow.rate,
            )
            .map_err(|source| ScenarioError::Generator {
                flow: flow.name.clone(),
                source,
            })?;

        let starting = Arc::clone(&generator);
        scheduler.schedule_at(SimTime::from_secs_f64(flow.start_secs), move |_| {
            if let Err(e) = starting.start() {
                tracing::warn!(generator = %starting.name(), error = %e, "Generator failed to start");
            }
        })?;
        let stopping = Arc::clone(&generator);
        scheduler.schedule_at(SimTime::from_secs_f64(flow.stop_secs), move |_| {
            stopping.stop()
        })?;

        flows.push(FlowHandle {
            generator,
            socket,
            tracer,
        });
    }

    tracing::info!(
        links = links.len(),
        flows = flows.len(),
        stop = config.stop_secs,
        "Running scenario"
    );
    let events_executed = scheduler.run();

    // Anything still running at the simulation stop time is torn down here.
    for flow in &flows {
        flow.generator.stop();
    }

    let wall_time = timer.stop();
    let report = ScenarioReport {
        generated_at: chrono::Utc::now().timestamp(),
        sim_time_secs: scheduler.now().as_secs_f64(),
        events_executed,
        wall_time_ms: u64::try_from(wall_time.as_millis()).unwrap_or(u64::MAX),
        flows: flows
            .iter()
            .map(|flow| FlowReport {
                generator: flow.generator.snapshot(),
                socket: flow.socket.stats(),
                window_model: flow.socket.window_model(),
                final_window: flow.socket.window(),
                window_samples: flow.tracer.as_ref().map_or(0, |p| p.sample_count()),
            })
            .collect(),
        links: links
            .iter()
            .map(|handle| LinkReport {
                name: handle.link.name().to_string(),
                traced: handle.tracer.is_some(),
                stats: handle.link.stats(),
                drops_observed: handle.tracer.as_ref().map_or(0, |p| p.drop_count()),
            })
            .collect(),
    };

    tracing::info!(
        events = report.events_executed,
        window_samples = report.total_window_samples(),
        drops = report.total_drops_observed(),
        wall_ms = report.wall_time_ms,
        "Scenario finished"
    );
    Ok(report)
}
