use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;

fn arena(keys: &[f32]) -> Vec<HeapNode> {
    keys.iter()
        .enumerate()
        .map(|(i, &key)| {
            let mut node = HeapNode::new(i as u32);
            node.set_key(key);
            node
        })
        .collect()
}

fn heap_with(nodes: &mut [HeapNode]) -> FibHeap {
    let mut heap = FibHeap::new();
    for i in 0..nodes.len() {
        heap.insert(nodes, i as NodeIndex);
    }
    heap
}

/// Walks the whole structure and checks heap order, list symmetry, parent
/// links, degrees and all three counters.
fn validate(heap: &FibHeap, nodes: &[HeapNode]) {
    if heap.min == NONE {
        assert_eq!(heap.num_nodes(), 0);
        assert_eq!(heap.num_trees(), 0);
        assert_eq!(heap.num_marked_nodes(), 0);
        return;
    }

    let min_key = nodes[heap.min as usize].key;
    let (mut count, mut trees, mut marked) = (0, 0, 0);
    let mut root = heap.min;
    loop {
        let node = &nodes[root as usize];
        assert_eq!(node.parent, NONE, "root {root} has a parent");
        assert!(!node.mark, "root {root} is marked");
        assert!(node.key >= min_key, "root {root} is below the minimum");
        assert_eq!(nodes[node.right as usize].left, root);
        trees += 1;
        walk_subtree(nodes, root, &mut count, &mut marked);
        root = node.right;
        if root == heap.min {
            break;
        }
    }

    assert_eq!(count, heap.num_nodes());
    assert_eq!(trees, heap.num_trees());
    assert_eq!(marked, heap.num_marked_nodes());
}

fn walk_subtree(nodes: &[HeapNode], x: NodeIndex, count: &mut usize, marked: &mut usize) {
    let node = &nodes[x as usize];
    *count += 1;
    if node.mark {
        *marked += 1;
    }
    if node.child == NONE {
        assert_eq!(node.degree, 0, "childless node {x} has degree {}", node.degree);
        return;
    }

    let mut children = 0;
    let mut y = node.child;
    loop {
        let child = &nodes[y as usize];
        assert_eq!(child.parent, x);
        assert!(child.key >= node.key, "heap order violated under {x}");
        assert_eq!(nodes[child.right as usize].left, y);
        walk_subtree(nodes, y, count, marked);
        children += 1;
        y = child.right;
        if y == node.child {
            break;
        }
    }
    assert_eq!(children, node.degree as usize);
}

fn drain_keys(heap: &mut FibHeap, nodes: &mut [HeapNode]) -> Vec<f32> {
    let mut keys = Vec::new();
    while let Some(i) = heap.extract_min(nodes) {
        keys.push(nodes[i as usize].key());
    }
    keys
}

#[test]
fn node_is_compact() {
    assert_eq!(std::mem::size_of::<HeapNode>(), 28);
}

#[test]
fn empty_heap() {
    let mut nodes = arena(&[]);
    let mut heap = FibHeap::new();
    assert!(heap.is_empty());
    assert_eq!(heap.minimum(), None);
    assert_eq!(heap.extract_min(&mut nodes), None);
    validate(&heap, &nodes);
}

#[test]
fn single_insert_extract() {
    let mut nodes = arena(&[4.0]);
    let mut heap = heap_with(&mut nodes);
    assert_eq!(heap.minimum(), Some(0));
    assert_eq!(heap.num_trees(), 1);
    assert_eq!(heap.extract_min(&mut nodes), Some(0));
    assert!(heap.is_empty());
    validate(&heap, &nodes);
}

#[test]
fn extracts_in_sorted_order() {
    let mut rng = StdRng::seed_from_u64(17);
    let keys: Vec<f32> = (0..500).map(|_| rng.random_range(0.0..1000.0)).collect();
    let mut nodes = arena(&keys);
    let mut heap = heap_with(&mut nodes);
    validate(&heap, &nodes);

    let drained = drain_keys(&mut heap, &mut nodes);
    let mut expected = keys.clone();
    expected.sort_by(f32::total_cmp);
    assert_eq!(drained, expected);
}

#[test]
fn bookkeeping_after_partial_extraction() {
    let mut rng = StdRng::seed_from_u64(3);
    let keys: Vec<f32> = (0..200).map(|_| rng.random_range(0.0..50.0)).collect();
    let mut nodes = arena(&keys);
    let mut heap = heap_with(&mut nodes);
    let mut held: Vec<usize> = (0..keys.len()).collect();

    for m in 1..=120 {
        let extracted = heap.extract_min(&mut nodes).unwrap() as usize;
        held.retain(|&i| i != extracted);

        assert_eq!(heap.num_nodes(), keys.len() - m);
        let smallest = held.iter().map(|&i| keys[i]).fold(f32::INFINITY, f32::min);
        assert_eq!(heap.minimum_key(&nodes), Some(smallest));
        if m % 20 == 0 {
            validate(&heap, &nodes);
        }
    }
}

#[test]
fn consolidation_distinct_root_degrees() {
    let keys: Vec<f32> = (1..=9).map(|k| k as f32).collect();
    let mut nodes = arena(&keys);
    let mut heap = heap_with(&mut nodes);
    assert_eq!(heap.num_trees(), 9);

    assert_eq!(heap.extract_min(&mut nodes), Some(0));
    // 8 remaining nodes link into one binomial tree of degree 3
    assert_eq!(heap.num_trees(), 1);
    let root = heap.minimum().unwrap();
    assert_eq!(nodes[root as usize].key(), 2.0);
    assert_eq!(nodes[root as usize].degree(), 3);
    validate(&heap, &nodes);
}

#[test]
fn decrease_key_updates_minimum() {
    let mut nodes = arena(&[5.0, 3.0, 8.0]);
    let mut heap = heap_with(&mut nodes);
    assert_eq!(heap.minimum(), Some(1));

    heap.decrease_key(&mut nodes, 2, 1.0).unwrap();
    assert_eq!(heap.minimum(), Some(2));
    assert_eq!(drain_keys(&mut heap, &mut nodes), vec![1.0, 3.0, 5.0]);
}

#[test]
fn decrease_key_rejects_increase_and_nan() {
    let mut nodes = arena(&[5.0, 3.0]);
    let mut heap = heap_with(&mut nodes);

    let err = heap.decrease_key(&mut nodes, 0, 6.0).unwrap_err();
    assert_eq!(
        err,
        HeapError::KeyIncrease {
            node: 0,
            current_key: 5.0,
            new_key: 6.0
        }
    );
    assert!(heap.decrease_key(&mut nodes, 0, f32::NAN).is_err());
    // equal key is accepted
    heap.decrease_key(&mut nodes, 0, 5.0).unwrap();
    assert_eq!(nodes[0].key(), 5.0);
    validate(&heap, &nodes);
}

#[test]
fn decrease_key_on_empty_heap_fails() {
    let mut nodes = arena(&[1.0]);
    let mut heap = FibHeap::new();
    assert_eq!(
        heap.decrease_key(&mut nodes, 0, 0.0),
        Err(HeapError::Empty { node: 0 })
    );
}

#[test]
fn cascading_cut_marks_then_cuts_parent() {
    let keys: Vec<f32> = (1..=9).map(|k| k as f32).collect();
    let mut nodes = arena(&keys);
    let mut heap = heap_with(&mut nodes);
    heap.extract_min(&mut nodes);

    // root of the B3 tree; find its degree-2 child and that child's children
    let root = heap.minimum().unwrap();
    let first = nodes[root as usize].child().unwrap();
    let mut p = first;
    while nodes[p as usize].degree() != 2 {
        p = nodes[p as usize].right;
        assert_ne!(p, first, "B3 root must have a degree-2 child");
    }
    let c1 = nodes[p as usize].child().unwrap();
    let c2 = nodes[c1 as usize].right;
    assert_ne!(c1, c2);

    heap.decrease_key(&mut nodes, c1, 0.5).unwrap();
    assert_eq!(heap.num_trees(), 2);
    assert_eq!(heap.num_marked_nodes(), 1);
    assert!(nodes[p as usize].is_marked());
    validate(&heap, &nodes);

    heap.decrease_key(&mut nodes, c2, 0.25).unwrap();
    // c2 cut, then its marked parent cut as well
    assert_eq!(heap.num_trees(), 4);
    assert_eq!(heap.num_marked_nodes(), 0);
    assert_eq!(nodes[p as usize].parent(), None);
    assert_eq!(heap.minimum(), Some(c2));
    validate(&heap, &nodes);

    assert_eq!(heap.num_nodes(), 8);
    let drained = drain_keys(&mut heap, &mut nodes);
    assert_eq!(drained.len(), 8);
    assert!(drained.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn decrease_key_without_violation_keeps_structure() {
    let keys: Vec<f32> = (1..=9).map(|k| k as f32 * 10.0).collect();
    let mut nodes = arena(&keys);
    let mut heap = heap_with(&mut nodes);
    heap.extract_min(&mut nodes);
    let trees = heap.num_trees();

    // the largest key sits below its parent; lowering it slightly keeps order
    heap.decrease_key(&mut nodes, 8, 89.0).unwrap();
    assert_eq!(heap.num_trees(), trees);
    assert_eq!(heap.num_marked_nodes(), 0);
    validate(&heap, &nodes);
}

#[test]
fn delete_removes_node() {
    let mut rng = StdRng::seed_from_u64(99);
    let keys: Vec<f32> = (0..64).map(|_| rng.random_range(-10.0..10.0)).collect();
    let mut nodes = arena(&keys);
    let mut heap = heap_with(&mut nodes);
    heap.extract_min(&mut nodes);

    let victim = (0..keys.len())
        .find(|&i| nodes[i].parent().is_some())
        .expect("consolidated heap has non-root nodes") as NodeIndex;
    heap.delete(&mut nodes, victim).unwrap();
    assert_eq!(heap.num_nodes(), 62);
    validate(&heap, &nodes);

    let mut remaining = 0;
    while let Some(i) = heap.extract_min(&mut nodes) {
        assert_ne!(i, victim);
        remaining += 1;
    }
    assert_eq!(remaining, 62);
}

#[test]
fn delete_with_existing_negative_infinity() {
    let mut nodes = arena(&[f32::NEG_INFINITY, 2.0, 3.0]);
    let mut heap = heap_with(&mut nodes);
    heap.delete(&mut nodes, 2).unwrap();
    assert_eq!(heap.num_nodes(), 2);
    assert_eq!(heap.extract_min(&mut nodes), Some(0));
    assert_eq!(heap.extract_min(&mut nodes), Some(1));
    assert!(heap.is_empty());
}

#[test]
fn union_splices_root_lists() {
    let keys = [9.0, 4.0, 7.0, 1.0, 6.0, 3.0, 8.0, 2.0];
    let mut nodes = arena(&keys);
    let mut a = FibHeap::new();
    let mut b = FibHeap::new();
    for i in 0..4 {
        a.insert(&mut nodes, i);
    }
    for i in 4..8 {
        b.insert(&mut nodes, i);
    }
    b.extract_min(&mut nodes); // key 2.0, leaves b consolidated
    assert_eq!(a.minimum(), Some(3));

    a.union(&mut nodes, b);
    assert_eq!(a.num_nodes(), 7);
    validate(&a, &nodes);
    assert_eq!(
        drain_keys(&mut a, &mut nodes),
        vec![1.0, 3.0, 4.0, 6.0, 7.0, 8.0, 9.0]
    );
}

#[test]
fn union_into_empty_heap() {
    let mut nodes = arena(&[2.0, 1.0]);
    let mut a = FibHeap::new();
    let b = heap_with(&mut nodes);
    a.union(&mut nodes, b);
    assert_eq!(a.minimum(), Some(1));
    assert_eq!(a.num_nodes(), 2);
    validate(&a, &nodes);
}

#[test]
fn equal_keys_all_extracted() {
    let mut nodes = arena(&[1.0; 33]);
    let mut heap = heap_with(&mut nodes);
    let mut seen = vec![false; 33];
    while let Some(i) = heap.extract_min(&mut nodes) {
        assert!(!seen[i as usize]);
        seen[i as usize] = true;
        validate(&heap, &nodes);
    }
    assert!(seen.iter().all(|&s| s));
}

#[test]
fn reinsert_after_clear() {
    let mut nodes = arena(&[3.0, 1.0, 2.0]);
    let mut heap = heap_with(&mut nodes);
    heap.extract_min(&mut nodes);
    heap.clear();
    validate(&heap, &nodes);

    for i in 0..3 {
        nodes[i].set_key(10.0 - i as f32);
        heap.insert(&mut nodes, i as NodeIndex);
    }
    assert_eq!(drain_keys(&mut heap, &mut nodes), vec![8.0, 9.0, 10.0]);
}

#[test]
fn randomized_operations_keep_invariants() {
    let mut rng = StdRng::seed_from_u64(2024);
    let n = 300;
    let keys: Vec<f32> = (0..n).map(|_| rng.random_range(0.0..1000.0)).collect();
    let mut nodes = arena(&keys);
    let mut heap = heap_with(&mut nodes);
    let mut held = vec![true; n];

    for step in 0..2000 {
        let roll = rng.random_range(0..10);
        if roll < 3 {
            if let Some(i) = heap.extract_min(&mut nodes) {
                let key = nodes[i as usize].key();
                held[i as usize] = false;
                let smaller = (0..n).any(|j| held[j] && nodes[j].key() < key);
                assert!(!smaller, "extracted {key} while a smaller key was held");
            }
        } else {
            let candidates: Vec<usize> = (0..n).filter(|&j| held[j]).collect();
            if candidates.is_empty() {
                break;
            }
            let j = candidates[rng.random_range(0..candidates.len())];
            let current = nodes[j].key();
            let lowered = current - rng.random_range(0.0..100.0);
            heap.decrease_key(&mut nodes, j as NodeIndex, lowered).unwrap();
        }
        if step % 100 == 0 {
            validate(&heap, &nodes);
        }
    }
    validate(&heap, &nodes);
}
