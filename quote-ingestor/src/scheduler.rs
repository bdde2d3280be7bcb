use std::sync::Arc;

use analytics::{PipelineConfig, ViewState};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, Interval, MissedTickBehavior};

use crate::backend::QuoteSource;
use crate::pipeline::{QuotePipeline, RefreshOutcome};

fn ticker(cfg: &PipelineConfig, immediate: bool) -> Interval {
    let period = cfg.interval();
    let mut t = if immediate {
        interval(period)
    } else {
        interval_at(Instant::now() + period, period)
    };
    t.set_missed_tick_behavior(MissedTickBehavior::Delay);
    t
}

/// Run one refresh in its own task so a newer one can be issued while it is
/// in flight; publish the view unless the result was superseded.
fn spawn_refresh<S>(
    pipeline: &Arc<QuotePipeline<S>>,
    config: &watch::Receiver<PipelineConfig>,
    views: &mpsc::Sender<ViewState>,
) where
    S: QuoteSource + 'static,
{
    let pipeline = pipeline.clone();
    let config = config.clone();
    let views = views.clone();
    let (market, tab) = {
        let cfg = config.borrow();
        (cfg.market, cfg.tab)
    };
    tokio::spawn(async move {
        let outcome = pipeline.refresh(market, tab).await;
        if matches!(outcome, RefreshOutcome::Superseded { .. }) {
            return;
        }
        let cfg = config.borrow().clone();
        let _ = views.send(pipeline.view(&cfg).await).await;
    });
}

/// Drive refreshes for the lifetime of the session.
///
/// Manual triggers, market/tab changes and the interval timer all end up in
/// [`QuotePipeline::refresh`]. Display-only changes (currency, hiding
/// unpriced rows) just recompute the view. The first timer tick fires
/// immediately so the board loads on start.
pub fn spawn_scheduler<S>(
    pipeline: Arc<QuotePipeline<S>>,
    mut config: watch::Receiver<PipelineConfig>,
    mut triggers: mpsc::Receiver<()>,
    mut shutdown: watch::Receiver<bool>,
    views: mpsc::Sender<ViewState>,
) -> JoinHandle<()>
where
    S: QuoteSource + 'static,
{
    tokio::spawn(async move {
        let mut current = config.borrow_and_update().clone();
        let mut timer = ticker(&current, true);

        loop {
            tokio::select! {
                _ = timer.tick() => {
                    tracing::debug!("interval refresh");
                    spawn_refresh(&pipeline, &config, &views);
                }
                Some(()) = triggers.recv() => {
                    tracing::debug!("manual refresh");
                    spawn_refresh(&pipeline, &config, &views);
                }
                changed = config.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let next = config.borrow_and_update().clone();
                    if next.interval_min() != current.interval_min() {
                        tracing::info!(interval_min = next.interval_min(), "refresh interval changed");
                        timer = ticker(&next, false);
                    }
                    let refetch = current.needs_refetch(&next);
                    current = next;
                    if refetch {
                        tracing::info!(market = %current.market, tab = %current.tab, "selection changed");
                        spawn_refresh(&pipeline, &config, &views);
                    } else {
                        let _ = views.send(pipeline.view(&current).await).await;
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("scheduler stopped");
    })
}
