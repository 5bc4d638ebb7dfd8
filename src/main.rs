use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use style_finder::cache::EmbeddingCache;
use style_finder::catalog::load_catalog;
use style_finder::cli::{Cli, Commands};
use style_finder::config::Config;
use style_finder::{BatchOptions, Encoder, ImageSource, OnnxExtractor, StyleFinder};
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_encoder(config: &Config, model: Option<PathBuf>) -> anyhow::Result<Encoder> {
    let model_path = match model {
        Some(path) => path,
        None => config.model_path()?,
    };
    let extractor = OnnxExtractor::load(&model_path, config.intra_threads)
        .with_context(|| format!("モデルを読み込めません: {}", model_path.display()))?;

    let encoder = Encoder::new(
        config.encoder_config()?,
        Arc::new(extractor),
        Duration::from_secs(config.timeout_seconds),
    )?;
    Ok(encoder)
}

fn load_finder(
    config: &Config,
    model: Option<PathBuf>,
    catalog: Option<PathBuf>,
    announce: bool,
) -> anyhow::Result<StyleFinder> {
    let catalog_path = match catalog {
        Some(path) => path,
        None => config.catalog_path()?,
    };

    let catalog = load_catalog(&catalog_path)
        .with_context(|| format!("カタログを読み込めません: {}", catalog_path.display()))?;
    let encoder = load_encoder(config, model)?;

    if announce {
        println!(
            "✔ カタログ: {}件（ベクトルあり {}件）",
            catalog.len(),
            catalog.present_count()
        );
        println!("✔ モデル: {}\n", encoder.model_name());
    }

    Ok(StyleFinder::new(encoder, catalog))
}

fn print_metadata(metadata: &serde_json::Map<String, serde_json::Value>) {
    for (key, value) in metadata {
        match value {
            serde_json::Value::String(s) => println!("    {}: {}", key, s),
            other => println!("    {}: {}", key, other),
        }
    }
}

fn write_json(output: Option<&Path>, value: &impl serde::Serialize) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("書き込みに失敗: {}", path.display()))?;
            println!("✔ 結果を保存: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Match { source, url, catalog, model, top, json } => {
            if !json {
                println!("🔍 style-finder - 類似画像検索\n");
            }

            let finder = load_finder(&config, model, catalog, !json)?;
            let source = ImageSource::new(source, url);

            if let Some(k) = top {
                let ranked = finder
                    .try_rank_source(&source, k)
                    .with_context(|| format!("照合に失敗: {}", source))?;

                if json {
                    write_json(None, &ranked)?;
                } else {
                    for (rank, m) in ranked.iter().enumerate() {
                        println!("{}. #{} (類似度 {:.4})", rank + 1, m.index, m.score);
                        print_metadata(&m.metadata);
                    }
                }
            } else {
                let report = finder
                    .try_match_source(&source)
                    .with_context(|| format!("照合に失敗: {}", source))?;

                if json {
                    write_json(None, &report)?;
                } else {
                    println!("✅ 最も近い画像: #{} (類似度 {:.4})", report.index, report.score);
                    print_metadata(&report.metadata);
                }
            }
        }

        Commands::Encode { source, url, model, output } => {
            let encoder = load_encoder(&config, model)?;
            let source = ImageSource::new(source, url);

            let encoding = encoder
                .try_encode(&source)
                .with_context(|| format!("エンコードに失敗: {}", source))?;
            write_json(output.as_deref(), &encoding)?;
        }

        Commands::Batch { folder, catalog, model, output, use_cache, recursive } => {
            println!("📸 style-finder - 一括照合\n");

            let finder = load_finder(&config, model, catalog, true)?;

            println!("[1/2] 照合中...{}", if use_cache { " (キャッシュ有効)" } else { "" });
            let options = BatchOptions {
                recursive,
                use_cache,
                progress: true,
            };
            let items = finder.match_folder(&folder, options)?;
            let matched = items.iter().filter(|i| i.is_matched()).count();
            println!("✔ {}枚中 {}枚を照合\n", items.len(), matched);

            println!("[2/2] 結果を保存中...");
            let output = output.unwrap_or_else(|| folder.join("matches.json"));
            write_json(Some(&output), &items)?;

            println!("\n✅ 完了");
        }

        Commands::Cache { clear, folder, info } => {
            let target = folder.unwrap_or_else(|| PathBuf::from("."));
            let cache_path = EmbeddingCache::cache_path(&target);

            if info || !clear {
                match EmbeddingCache::read(&target) {
                    Ok(cache) => {
                        println!("キャッシュ情報:");
                        println!("  パス: {}", cache_path.display());
                        println!("  件数: {}", cache.len());
                        println!("  設定: {}", cache.fingerprint());
                        if let Ok(meta) = std::fs::metadata(&cache_path) {
                            println!("  サイズ: {} bytes", meta.len());
                        }
                    }
                    Err(_) if !cache_path.exists() => {
                        println!("キャッシュファイルが存在しません: {}", cache_path.display());
                    }
                    Err(e) => println!("キャッシュ読み込みエラー: {}", e),
                }
            }

            if clear {
                match EmbeddingCache::clear(&target) {
                    Ok(true) => println!("✔ キャッシュを削除しました: {}", cache_path.display()),
                    Ok(false) => println!("キャッシュファイルが存在しません"),
                    Err(e) => println!("キャッシュ削除エラー: {}", e),
                }
            }
        }

        Commands::Config { set_model, set_catalog, show } => {
            let mut config = config;

            if let Some(path) = set_model {
                config.set_model(path)?;
                println!("✔ モデルを設定しました");
            }

            if let Some(path) = set_catalog {
                config.set_catalog(path)?;
                println!("✔ カタログを設定しました");
            }

            if show {
                let unset = || "未設定".to_string();
                println!("設定:");
                println!(
                    "  モデル: {}",
                    config.model_path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(unset)
                );
                println!(
                    "  カタログ: {}",
                    config.catalog_path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(unset)
                );
                println!("  入力サイズ: {}x{}", config.image_size[0], config.image_size[1]);
                println!("  正規化平均: {:?}", config.norm_mean);
                println!("  正規化標準偏差: {:?}", config.norm_std);
                println!("  JPEG品質: {}", config.jpeg_quality);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
            }
        }
    }

    Ok(())
}
