use bedrock::log::LineQueue;
use bedrock::log::LogLine;
use bedrock::log::Verbosity;
use bedrock::name::Name;
use loom::sync::Arc;
use loom::thread;

fn line(text: &str) -> LogLine {
  LogLine::new(text, Verbosity::Info, Name::NONE, None)
}

#[test]
fn concurrent_pushes_preserve_producer_order() {
  loom::model(|| {
    let queue: Arc<LineQueue> = Arc::new(LineQueue::new());

    let producers: Vec<_> = (0..2)
      .map(|producer| {
        let queue: Arc<LineQueue> = Arc::clone(&queue);

        thread::spawn(move || {
          queue.push(line(&format!("{producer}:0")));
          queue.push(line(&format!("{producer}:1")));
        })
      })
      .collect();

    for handle in producers {
      handle.join().unwrap();
    }

    let mut last_seen: [i32; 2] = [-1; 2];
    let mut total: usize = 0;

    for entry in queue.drain() {
      let (producer, index) = entry.text().split_once(':').unwrap();
      let producer: usize = producer.parse().unwrap();
      let index: i32 = index.parse().unwrap();

      assert!(index > last_seen[producer], "per-producer order violated");
      last_seen[producer] = index;
      total += 1;
    }

    assert_eq!(total, 4);
    assert!(queue.is_empty());
  });
}

#[test]
fn drain_racing_a_push_loses_nothing() {
  loom::model(|| {
    let queue: Arc<LineQueue> = Arc::new(LineQueue::new());

    let producer = {
      let queue: Arc<LineQueue> = Arc::clone(&queue);

      thread::spawn(move || {
        queue.push(line("racer"));
      })
    };

    let early: usize = queue.drain().count();

    producer.join().unwrap();

    let late: usize = queue.drain().count();

    assert_eq!(early + late, 1);
  });
}
