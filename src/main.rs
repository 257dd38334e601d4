use std::env;

use rand::Rng;

use seqfeat::config::AssemblerConfig;
use seqfeat::layers::AssemblerInput;
use seqfeat::math;
use seqfeat::tensor::{IndexTensor, Tensor};
use seqfeat::util::logging;
use seqfeat::util::simple_logger;
use seqfeat::info;

fn main() {
    simple_logger::init_from_env();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <mode> [config]", args[0]);
        eprintln!("Modes: assemble | embed");
        return;
    }

    match args[1].as_str() {
        "assemble" => {
            let cfg = args
                .get(2)
                .and_then(|p| AssemblerConfig::from_path(p))
                .unwrap_or_default();
            run_assemble(&cfg);
        }
        "embed" => run_embed(),
        mode => eprintln!("Unknown mode {}", mode),
    }
}

/// Build the pipeline from the config and assemble one synthetic batch.
fn run_assemble(cfg: &AssemblerConfig) {
    let batch = 10;
    let mut rng = rand::thread_rng();
    math::reset_gather_ops();

    let (assembler, _owned) = match cfg.build() {
        Ok(v) => v,
        Err(e) => {
            seqfeat::error!("{}", e);
            return;
        }
    };
    info!(
        "assembler with T = {} referencing {} embedding tables",
        assembler.time_len(),
        assembler.num_parameters()
    );

    let static_cat = cfg.embed_static.as_ref().map(|e| {
        let f = e.cardinalities.len();
        let data = (0..batch * f)
            .map(|i| rng.gen_range(0..e.cardinalities[i % f]))
            .collect();
        IndexTensor::new(data, vec![batch, f])
    });
    let dynamic_cat = cfg.embed_dynamic.as_ref().map(|e| {
        let f = e.cardinalities.len();
        let data = (0..batch * cfg.t * f)
            .map(|i| rng.gen_range(0..e.cardinalities[i % f]))
            .collect();
        IndexTensor::new(data, vec![batch, cfg.t, f])
    });
    let static_real = Tensor::new(
        (0..batch * 2).map(|_| rng.gen::<f32>()).collect(),
        vec![batch, 2],
    );
    let dynamic_real = Tensor::new(
        (0..batch * cfg.t * 3).map(|_| rng.gen::<f32>()).collect(),
        vec![batch, cfg.t, 3],
    );

    let input = AssemblerInput {
        static_cat: static_cat.as_ref(),
        static_real: Some(&static_real),
        dynamic_cat: dynamic_cat.as_ref(),
        dynamic_real: Some(&dynamic_real),
    };
    match assembler.forward(&input) {
        Ok(out) => {
            logging::log_assembled_shape(&out.shape);
            logging::log_total_gathers(math::gather_ops_count());
        }
        Err(e) => seqfeat::error!("{}", e),
    }
}

/// Run a bare multi-feature embedder forward.
fn run_embed() {
    use seqfeat::layers::FeatureEmbedder;

    let mut rng = rand::thread_rng();
    math::reset_gather_ops();
    let cardinalities = [50, 50, 50, 50];
    let embedding_dims = [10, 20, 30, 40];
    let embedder = match FeatureEmbedder::new(&cardinalities, &embedding_dims) {
        Ok(e) => e,
        Err(e) => {
            seqfeat::error!("{}", e);
            return;
        }
    };

    let batch = 10;
    let f = cardinalities.len();
    let data = (0..batch * f)
        .map(|i| rng.gen_range(0..cardinalities[i % f]))
        .collect();
    let x = IndexTensor::new(data, vec![batch, f]);
    match embedder.forward(&x) {
        Ok(out) => {
            info!("embedded {} features into width {}", f, out.last_dim());
            logging::log_assembled_shape(&out.shape);
            logging::log_total_gathers(math::gather_ops_count());
        }
        Err(e) => seqfeat::error!("{}", e),
    }
}
