//! End-to-end upload/download round trip against the in-memory simulated
//! network, across sizes that straddle chunk, segment, and multi-segment
//! boundaries.

use std::io::Write;

use ionian_client::cancel::CancellationToken;
use ionian_client::config::{ClientConfig, SEG};
use ionian_client::error::Error;
use ionian_client::file::downloader::Downloader;
use ionian_client::file::uploader::Uploader;
use ionian_client::memory;
use ionian_client::node::StorageNodeClient;

fn write_random_file(size: usize) -> tempfile::TempPath {
    let data: Vec<u8> = (0..size).map(|i| ((i * 2654435761) % 256) as u8).collect();
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(&data).unwrap();
    tmp.into_temp_path()
}

#[test]
fn upload_then_download_is_byte_identical_and_root_equal_across_sizes() {
    for size in [1usize, 255, 256, 257, SEG, SEG + 1, 5 * SEG + 123] {
        let source = write_random_file(size);
        let (chain, nodes) = memory::network(3);
        let node_refs: Vec<&dyn StorageNodeClient> =
            nodes.iter().map(|n| n as &dyn StorageNodeClient).collect();
        let cancel = CancellationToken::new();

        let uploader = Uploader::new(node_refs.clone(), &chain, ClientConfig::default());
        let root = uploader.upload(&source, &cancel).unwrap_or_else(|e| {
            panic!("upload failed for size {size}: {e}")
        });

        let target = source.with_extension("out");
        let downloader = Downloader::new(node_refs, ClientConfig::default());
        downloader
            .download(root, &target, &cancel)
            .unwrap_or_else(|e| panic!("download failed for size {size}: {e}"));

        let original = std::fs::read(&source).unwrap();
        let downloaded = std::fs::read(&target).unwrap();
        assert_eq!(original, downloaded, "byte mismatch for size {size}");
        assert_eq!(original.len(), size);

        std::fs::remove_file(&target).unwrap();
    }
}

#[test]
fn sequential_upload_against_a_single_endpoint_round_trips() {
    // upload_sequential only ever pushes to the first configured endpoint,
    // so the network here has exactly one node to download back from.
    let source = write_random_file(5 * SEG + 17);
    let (chain, nodes) = memory::network(1);
    let node_refs: Vec<&dyn StorageNodeClient> =
        nodes.iter().map(|n| n as &dyn StorageNodeClient).collect();
    let cancel = CancellationToken::new();

    let uploader = Uploader::new(node_refs.clone(), &chain, ClientConfig::default());
    let root = uploader.upload_sequential(&source, &cancel).unwrap();

    let target = source.with_extension("seq_out");
    let downloader = Downloader::new(node_refs, ClientConfig::default());
    downloader.download(root, &target, &cancel).unwrap();

    assert_eq!(std::fs::read(&source).unwrap(), std::fs::read(&target).unwrap());
    std::fs::remove_file(&target).unwrap();
}

#[test]
fn re_uploading_an_already_finalized_root_is_rejected() {
    let source = write_random_file(3 * SEG + 9);
    let (chain, nodes) = memory::network(2);
    let node_refs: Vec<&dyn StorageNodeClient> =
        nodes.iter().map(|n| n as &dyn StorageNodeClient).collect();
    let cancel = CancellationToken::new();

    let uploader = Uploader::new(node_refs.clone(), &chain, ClientConfig::default());
    uploader.upload(&source, &cancel).unwrap();

    let err = uploader.upload(&source, &cancel).unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(_)));
}

#[test]
fn single_chunk_file_pads_to_one_chunk_with_a_single_node_submission() {
    use ionian_client::file::segment::FileTree;
    use ionian_client::file::submission::build_submission;
    use ionian_client::file::File as IonianFile;

    let source = write_random_file(5);
    let file = IonianFile::open(&source).unwrap();
    assert_eq!(file.num_chunks(), 1);
    assert_eq!(file.num_segments(), 1);

    let submission = build_submission(&file).unwrap();
    assert_eq!(submission.nodes.len(), 1);
    assert_eq!(submission.nodes[0].height, 0);

    let tree = FileTree::build(&file).unwrap();
    let proof = tree.proof_for_segment(0).unwrap();
    assert!(proof.path.is_empty());
}
