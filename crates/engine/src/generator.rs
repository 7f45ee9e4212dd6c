use crate::world::chunk::Chunk;
use crate::world::position::ChunkPos;

/// Fills a fresh chunk when the provider has nothing saved for it.
pub trait Generator: Send + Sync {
    fn generate(&self, pos: ChunkPos, chunk: &mut Chunk);
}

impl<F> Generator for F
where
    F: Fn(ChunkPos, &mut Chunk) + Send + Sync,
{
    fn generate(&self, pos: ChunkPos, chunk: &mut Chunk) {
        self(pos, chunk)
    }
}
