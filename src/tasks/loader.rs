use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::select;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{DeviceClass, GapPolicy, SequenceConfig};
use crate::error::Error;
use crate::events::{DecodedFrame, FrameTable, LoadState};

/// The concrete frames one mount will request.
#[derive(Debug, Clone)]
pub struct LoadPlan {
    pub device: DeviceClass,
    pub paths: Vec<PathBuf>,
}

impl LoadPlan {
    /// Choose the asset set for a viewport `width` and list every frame path.
    pub fn for_viewport(cfg: &SequenceConfig, width: f64) -> Self {
        let device = cfg.device_class(width);
        Self {
            device,
            paths: cfg.frame_paths(device),
        }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// First frame of the sequence, shown while the table is still loading.
    pub fn poster(&self) -> Option<&Path> {
        self.paths.first().map(PathBuf::as_path)
    }
}

fn decode_frame(path: &Path) -> Result<image::RgbaImage, Error> {
    let decode = || -> image::ImageResult<image::RgbaImage> {
        Ok(image::ImageReader::open(path)?
            .with_guessed_format()?
            .decode()?
            .to_rgba8())
    };
    decode().map_err(|source| Error::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode every frame of `plan` in parallel and wait for all of them.
///
/// Each slot resolves to the decoded frame or `None`; a failed frame never
/// fails the batch. Returns `None` only when cancelled first.
pub async fn load_frames(
    plan: &LoadPlan,
    cancel: &CancellationToken,
) -> Option<Vec<Option<DecodedFrame>>> {
    let mut results: Vec<Option<DecodedFrame>> = Vec::with_capacity(plan.len());
    results.resize_with(plan.len(), || None);

    let mut tasks: JoinSet<(usize, Option<DecodedFrame>)> = JoinSet::new();
    for (index, path) in plan.paths.iter().cloned().enumerate() {
        tasks.spawn(async move {
            let p = path.clone();
            let res = tokio::task::spawn_blocking(move || decode_frame(&p)).await;
            let frame = match res {
                Ok(Ok(image)) => Some(DecodedFrame {
                    path,
                    sequence_index: index,
                    image,
                }),
                Ok(Err(err)) => {
                    debug!(error = %err, "frame decode failed");
                    None
                }
                Err(err) => {
                    debug!(error = %err, path = %path.display(), "frame decode task aborted");
                    None
                }
            };
            (index, frame)
        });
    }

    loop {
        select! {
            biased;
            _ = cancel.cancelled() => {
                tasks.abort_all();
                return None;
            }
            joined = tasks.join_next() => {
                match joined {
                    Some(Ok((index, frame))) => results[index] = frame,
                    Some(Err(err)) => warn!(error = %err, "frame task panicked"),
                    None => break,
                }
            }
        }
    }
    Some(results)
}

/// Build the published table from per-slot decode results.
pub fn assemble(results: Vec<Option<DecodedFrame>>, policy: GapPolicy) -> FrameTable {
    let requested = results.len();
    let failed: Vec<usize> = results
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_none())
        .map(|(i, _)| i)
        .collect();
    let slots: Vec<Option<Arc<DecodedFrame>>> =
        results.into_iter().map(|r| r.map(Arc::new)).collect();

    let frames = match policy {
        GapPolicy::Drop => slots.into_iter().flatten().collect(),
        GapPolicy::NearestNeighbor => fill_gaps(&slots),
    };
    FrameTable::new(frames, requested, failed)
}

/// Replace each empty slot with the closest filled one, preferring the
/// earlier frame on ties. Empty when nothing decoded.
fn fill_gaps(slots: &[Option<Arc<DecodedFrame>>]) -> Vec<Arc<DecodedFrame>> {
    if slots.iter().all(Option::is_none) {
        return Vec::new();
    }
    let n = slots.len();
    let mut prev: Vec<Option<usize>> = vec![None; n];
    let mut last = None;
    for i in 0..n {
        if slots[i].is_some() {
            last = Some(i);
        }
        prev[i] = last;
    }
    let mut next: Vec<Option<usize>> = vec![None; n];
    let mut upcoming = None;
    for i in (0..n).rev() {
        if slots[i].is_some() {
            upcoming = Some(i);
        }
        next[i] = upcoming;
    }

    (0..n)
        .filter_map(|i| {
            let source = match (prev[i], next[i]) {
                (Some(p), Some(q)) => {
                    if i - p <= q - i {
                        p
                    } else {
                        q
                    }
                }
                (Some(p), None) => p,
                (None, Some(q)) => q,
                (None, None) => return None,
            };
            slots[source].clone()
        })
        .collect()
}

/// Load the whole sequence once and publish the table.
///
/// `state_tx` must start out `Loading`; it stays that way until every
/// request has settled and then becomes `Ready` exactly once. There is no retry and no timeout.
pub async fn run(
    plan: LoadPlan,
    policy: GapPolicy,
    state_tx: watch::Sender<LoadState>,
    cancel: CancellationToken,
) -> Result<()> {
    info!(
        device = %plan.device,
        frames = plan.len(),
        poster = ?plan.poster(),
        "loading frame sequence"
    );

    let Some(results) = load_frames(&plan, &cancel).await else {
        debug!("frame loading cancelled");
        return Ok(());
    };

    let table = assemble(results, policy);
    if !table.failed().is_empty() {
        warn!(
            failed = table.failed().len(),
            indices = ?table.failed(),
            policy = ?policy,
            "some frames failed to decode"
        );
    }
    if let Some(first) = table.first() {
        let (width, height) = first.dimensions();
        info!(frames = table.len(), width, height, "frame table ready");
    } else {
        warn!("no frames decoded; the sequence will not paint");
    }
    state_tx.send_replace(LoadState::Ready(Arc::new(table)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(index: usize) -> DecodedFrame {
        DecodedFrame {
            path: PathBuf::from(format!("f{index}.jpg")),
            sequence_index: index,
            image: image::RgbaImage::new(1, 1),
        }
    }

    fn slots(pattern: &str) -> Vec<Option<DecodedFrame>> {
        pattern
            .chars()
            .enumerate()
            .map(|(i, c)| (c == 'x').then(|| frame(i)))
            .collect()
    }

    fn sources(table: &FrameTable) -> Vec<usize> {
        table.frames().iter().map(|f| f.sequence_index).collect()
    }

    #[test]
    fn drop_policy_keeps_successes_in_order() {
        let table = assemble(slots("x.xx.x"), GapPolicy::Drop);
        assert_eq!(table.len(), 4);
        assert_eq!(table.requested(), 6);
        assert_eq!(table.failed(), &[1, 4]);
        assert_eq!(sources(&table), vec![0, 2, 3, 5]);
    }

    #[test]
    fn nearest_neighbor_keeps_indices_aligned() {
        let table = assemble(slots("..x..x."), GapPolicy::NearestNeighbor);
        assert_eq!(table.len(), 7);
        // Slot 3 sits closer to frame 2, slot 4 closer to frame 5.
        assert_eq!(sources(&table), vec![2, 2, 2, 2, 5, 5, 5]);
    }

    #[test]
    fn nearest_neighbor_ties_prefer_earlier_frame() {
        let table = assemble(slots("x.x"), GapPolicy::NearestNeighbor);
        assert_eq!(sources(&table), vec![0, 0, 2]);
    }

    #[test]
    fn all_failed_yields_empty_table() {
        for policy in [GapPolicy::Drop, GapPolicy::NearestNeighbor] {
            let table = assemble(slots("...."), policy);
            assert!(table.is_empty());
            assert_eq!(table.failed().len(), 4);
        }
    }

    #[test]
    fn plan_uses_mobile_paths_below_breakpoint() {
        let cfg = SequenceConfig {
            frame_count: 3,
            ..SequenceConfig::default()
        };
        let plan = LoadPlan::for_viewport(&cfg, 390.0);
        assert_eq!(plan.device, DeviceClass::Mobile);
        assert_eq!(plan.len(), 3);
        assert_eq!(
            plan.poster(),
            Some(Path::new("public/framesmobile/ezgif-frame-001.jpg"))
        );
    }
}
