mod originals;

pub use originals::FsOriginalStore;
