//! Prefetched block generation.
//!
//! The generator runs on a scoped producer thread and feeds a bounded
//! channel; dispatch stays on the calling thread and consumes blocks in
//! index order. When dispatch fails the receiver is dropped, the
//! producer's next send fails, and it stops.
//!
//! ```text
//!   producer thread                      caller thread
//!   generate_block(0..n) ──[bounded(depth)]──> dispatch(block, index)
//! ```

use std::thread;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};
use skyvis_core::{BlockGenerator, BlockIndex, GenerateError, RunMode, VisBlock};

use crate::error::RunError;
use crate::lifecycle::generate_checked;

/// One generator result, tagged with its index and timing.
struct Produced {
    index: BlockIndex,
    result: Result<VisBlock, GenerateError>,
    generate_us: u64,
}

/// Run one pass with the generator `depth` blocks ahead of dispatch.
///
/// `dispatch` receives each block, its index and the microseconds spent
/// generating it.
pub(crate) fn run_prefetched<F>(
    generator: &mut dyn BlockGenerator,
    num_blocks: usize,
    mode: RunMode,
    depth: usize,
    mut dispatch: F,
) -> Result<(), RunError>
where
    F: FnMut(VisBlock, BlockIndex, u64) -> Result<(), RunError>,
{
    let (tx, rx) = crossbeam_channel::bounded::<Produced>(depth);

    thread::scope(move |scope| {
        let producer = thread::Builder::new()
            .name("skyvis-generator".to_string())
            .spawn_scoped(scope, move || produce(generator, num_blocks, mode, tx))
            .map_err(|e| RunError::Producer {
                reason: format!("spawn failed: {e}"),
            })?;

        let outcome = consume(&rx, num_blocks, mode, &mut dispatch);
        // Unblocks a producer waiting on a full channel.
        drop(rx);

        match producer.join() {
            Ok(()) => outcome,
            Err(_) => Err(RunError::Producer {
                reason: "generator thread panicked".to_string(),
            }),
        }
    })
}

fn produce(
    generator: &mut dyn BlockGenerator,
    num_blocks: usize,
    mode: RunMode,
    tx: Sender<Produced>,
) {
    for i in 0..num_blocks {
        let index = BlockIndex(i);
        let start = Instant::now();
        let result = generate_checked(generator, index, mode);
        let failed = result.is_err();
        let produced = Produced {
            index,
            result,
            generate_us: start.elapsed().as_micros() as u64,
        };
        if tx.send(produced).is_err() || failed {
            return;
        }
    }
}

fn consume<F>(
    rx: &Receiver<Produced>,
    num_blocks: usize,
    mode: RunMode,
    dispatch: &mut F,
) -> Result<(), RunError>
where
    F: FnMut(VisBlock, BlockIndex, u64) -> Result<(), RunError>,
{
    let mut received = 0;
    for produced in rx.iter() {
        debug_assert_eq!(produced.index, BlockIndex(received));
        let block = produced.result.map_err(|source| RunError::Generate {
            pass: mode.pass(),
            source,
        })?;
        dispatch(block, produced.index, produced.generate_us)?;
        received += 1;
    }
    if received != num_blocks {
        return Err(RunError::Producer {
            reason: format!("generator stopped after {received} of {num_blocks} blocks"),
        });
    }
    Ok(())
}
